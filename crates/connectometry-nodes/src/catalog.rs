// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Built-in atlas catalog.

Catalog atlases are looked up by name and backed by files in a data
directory:

| kind | files |
|---|---|
| parcellation | `<name>.nii.gz`, optional `<name>_labels.txt` |
| coordinates | `<name>_coords.txt` (`x y z [label]` per row) |
*/

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasKind {
    Parcellation,
    Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub kind: AtlasKind,
}

const ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        name: "atlas_aal",
        kind: AtlasKind::Parcellation,
    },
    CatalogEntry {
        name: "atlas_craddock_2012",
        kind: AtlasKind::Parcellation,
    },
    CatalogEntry {
        name: "atlas_destrieux_2009",
        kind: AtlasKind::Parcellation,
    },
    CatalogEntry {
        name: "coords_power_2011",
        kind: AtlasKind::Coordinates,
    },
    CatalogEntry {
        name: "coords_dosenbach_2010",
        kind: AtlasKind::Coordinates,
    },
];

/// Catalog bound to a data directory
#[derive(Debug, Clone)]
pub struct AtlasCatalog {
    data_dir: PathBuf,
}

impl AtlasCatalog {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn entries() -> &'static [CatalogEntry] {
        ENTRIES
    }

    pub fn lookup(&self, name: &str) -> Option<&'static CatalogEntry> {
        ENTRIES.iter().find(|e| e.name == name)
    }

    /// File holding the atlas volume or coordinate list
    pub fn source_path(&self, entry: &CatalogEntry) -> PathBuf {
        match entry.kind {
            AtlasKind::Parcellation => self.data_dir.join(format!("{}.nii.gz", entry.name)),
            AtlasKind::Coordinates => self.data_dir.join(format!("{}_coords.txt", entry.name)),
        }
    }

    /// Packaged label file, if one exists on disk
    pub fn labels_path(&self, entry: &CatalogEntry) -> Option<PathBuf> {
        if entry.kind != AtlasKind::Parcellation {
            return None;
        }
        let path = self.data_dir.join(format!("{}_labels.txt", entry.name));
        path.is_file().then_some(path)
    }

    /// `<data_dir>/<atlas>.txt`, the last file consulted for labels
    pub fn fallback_labels_path(&self, atlas: &str) -> PathBuf {
        self.data_dir.join(format!("{}.txt", atlas))
    }
}
