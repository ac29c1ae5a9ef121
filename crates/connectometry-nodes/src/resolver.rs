// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Atlas resolution: from an atlas name and/or file to a [`NodeSet`].

Catalog names take precedence over a user file. A user file is either a
label volume (`.nii`, `.nii.gz`) or a coordinate list (`.txt`, `.csv`,
`.tsv`). A label volume yields one parcel per distinct non-zero value; when
parcel nodes are not requested its parcels are reduced to their centroids.
*/

use crate::labels::{resolve_labels, LabelSource};
use crate::parcellation::split_parcels;
use crate::{AtlasCatalog, Node, NodeError, NodeGeometry, NodeLayout, NodeResult, NodeSet};
use connectometry_volume::{is_volume_path, read_volume, WorldCoordinate};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What the caller asked for
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtlasRequest {
    /// Catalog name (or free-form name for a user file)
    pub atlas: Option<String>,
    /// User atlas file: label volume or coordinate list
    pub source_file: Option<PathBuf>,
    /// `index name` label file
    pub reference_labels: Option<PathBuf>,
    /// Parcel nodes instead of coordinate nodes
    pub parcellated: bool,
}

/// Result of a resolution
#[derive(Debug, Clone)]
pub struct ResolvedAtlas {
    pub nodes: NodeSet,
    /// `<input dir>/<atlas>`, created on resolution
    pub output_dir: PathBuf,
    /// Number of parcels found when the source was a label volume
    pub parcel_count: Option<usize>,
}

pub struct AtlasResolver {
    catalog: AtlasCatalog,
}

impl AtlasResolver {
    pub fn new(catalog: AtlasCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &AtlasCatalog {
        &self.catalog
    }

    /// Resolve `request` and create the output directory next to `input_volume`
    pub fn resolve(&self, request: &AtlasRequest, input_volume: &Path) -> NodeResult<ResolvedAtlas> {
        let (atlas, source, packaged_labels) = self.locate(request)?;
        if !source.is_file() {
            return Err(NodeError::MissingAtlasFile(source));
        }

        let (nodes, parcel_count, embedded) = if is_volume_path(&source) {
            let (nodes, count) = load_parcellation(&atlas, &source, request.parcellated)?;
            (nodes, Some(count), None)
        } else if is_coordinate_path(&source) {
            if request.parcellated {
                return Err(NodeError::InvalidRequest(format!(
                    "coordinate atlas '{}' cannot be used for parcel nodes",
                    atlas
                )));
            }
            let (coords, labels) = parse_coordinate_list(&source)?;
            (coordinate_set(&atlas, coords)?, None, labels)
        } else {
            return Err(NodeError::UnsupportedSource(source));
        };

        if nodes.is_empty() {
            return Err(NodeError::EmptyAtlas(atlas));
        }

        let embedded = match packaged_labels {
            Some(path) => crate::parse_label_file(&path).ok(),
            None => embedded,
        };
        let resolved = resolve_labels(
            nodes.len(),
            embedded,
            request.reference_labels.as_deref(),
            &self.catalog.fallback_labels_path(&atlas),
        );

        let atlas = match &resolved.source {
            LabelSource::Reference(path) => atlas_stem(path),
            _ => atlas,
        };
        let nodes = nodes
            .relabelled(resolved.labels)
            .ok_or_else(|| NodeError::LayoutMismatch("label count".to_string()))?
            .renamed(atlas.clone());

        let output_dir = input_volume
            .canonicalize()?
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
            .join(&atlas);
        std::fs::create_dir_all(&output_dir)?;

        info!(
            atlas = %atlas,
            nodes = nodes.len(),
            parcellated = nodes.is_parcellated(),
            "Resolved atlas"
        );
        Ok(ResolvedAtlas {
            nodes,
            output_dir,
            parcel_count,
        })
    }

    /// Atlas name, source file and packaged labels file
    fn locate(&self, request: &AtlasRequest) -> NodeResult<(String, PathBuf, Option<PathBuf>)> {
        if let Some(entry) = request.atlas.as_deref().and_then(|a| self.catalog.lookup(a)) {
            debug!(atlas = entry.name, kind = ?entry.kind, "Using catalog atlas");
            return Ok((
                entry.name.to_string(),
                self.catalog.source_path(entry),
                self.catalog.labels_path(entry),
            ));
        }

        match (&request.atlas, &request.source_file) {
            (_, Some(file)) => Ok((atlas_stem(file), file.clone(), None)),
            (Some(name), None) => Err(NodeError::UnknownAtlas(name.clone())),
            (None, None) => Err(NodeError::NoAtlasSpecified),
        }
    }
}

/// File name without `.nii.gz` or its last extension
pub(crate) fn atlas_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if let Some(stripped) = name.strip_suffix(".nii.gz") {
        return stripped.to_string();
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

fn is_coordinate_path(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("txt") | Some("csv") | Some("tsv")
    )
}

fn load_parcellation(atlas: &str, source: &Path, parcellated: bool) -> NodeResult<(NodeSet, usize)> {
    let volume = read_volume(source)?;
    let grid = volume.grid();
    let parcels = split_parcels(&volume);
    let count = parcels.len();
    debug!(atlas, parcels = count, "Split label volume into parcels");

    let set = if parcellated {
        let nodes = parcels
            .into_iter()
            .enumerate()
            .map(|(index, parcel)| Node {
                index,
                label: String::new(),
                geometry: NodeGeometry::Parcel(parcel),
            })
            .collect();
        NodeSet::new(atlas, NodeLayout::Parcels(grid), nodes)?
    } else {
        coordinate_set(atlas, parcels.iter().map(|p| p.centroid).collect())?
    };
    Ok((set, count))
}

fn coordinate_set(atlas: &str, coords: Vec<WorldCoordinate>) -> NodeResult<NodeSet> {
    let nodes = coords
        .into_iter()
        .enumerate()
        .map(|(index, c)| Node {
            index,
            label: String::new(),
            geometry: NodeGeometry::Coordinate(c),
        })
        .collect();
    NodeSet::new(atlas, NodeLayout::Coordinates, nodes)
}

/// Rows of `x y z [label...]`; labels count only when every row has one
fn parse_coordinate_list(path: &Path) -> NodeResult<(Vec<WorldCoordinate>, Option<Vec<String>>)> {
    let text = std::fs::read_to_string(path)?;
    let mut coords = Vec::new();
    let mut labels = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() < 3 {
            return Err(NodeError::Parse {
                path: path.display().to_string(),
                line: line_no + 1,
                reason: format!("expected at least 3 columns, found {}", tokens.len()),
            });
        }
        let mut c = [0.0; 3];
        for (axis, token) in tokens[..3].iter().enumerate() {
            c[axis] = token.parse::<f64>().map_err(|e| NodeError::Parse {
                path: path.display().to_string(),
                line: line_no + 1,
                reason: format!("'{}': {}", token, e),
            })?;
        }
        coords.push(c);
        if tokens.len() > 3 {
            labels.push(tokens[3..].join(" "));
        }
    }
    let labels = (!labels.is_empty() && labels.len() == coords.len()).then_some(labels);
    Ok((coords, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atlas_stem() {
        assert_eq!(atlas_stem(Path::new("/a/b/my_atlas.nii.gz")), "my_atlas");
        assert_eq!(atlas_stem(Path::new("/a/b/coords.txt")), "coords");
        assert_eq!(atlas_stem(Path::new("shen.nii")), "shen");
    }

    #[test]
    fn test_coordinate_extensions() {
        assert!(is_coordinate_path(Path::new("x.txt")));
        assert!(is_coordinate_path(Path::new("x.CSV")));
        assert!(!is_coordinate_path(Path::new("x.nii.gz")));
    }
}
