// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Node label resolution.

Labels come from the first source that yields exactly one label per node:

1. labels shipped with the catalog entry or embedded in a coordinate list
2. a user reference file of `index name` lines
3. `<data_dir>/<atlas>.txt` in the same format
4. synthesized labels `1..=N`

A source that cannot be read or parsed, or has the wrong number of entries,
is skipped with a warning.
*/

use crate::{NodeError, NodeResult};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where the labels of a node set came from
#[derive(Debug, Clone, PartialEq)]
pub enum LabelSource {
    Embedded,
    Reference(PathBuf),
    AtlasFile(PathBuf),
    Synthesized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLabels {
    pub labels: Vec<String>,
    pub source: LabelSource,
}

/// Parse a whitespace-delimited `index name` file; the name is everything
/// after the first token.
pub fn parse_label_file(path: &Path) -> NodeResult<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let mut labels = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((_, name)) = line.split_once(char::is_whitespace) else {
            return Err(NodeError::Parse {
                path: path.display().to_string(),
                line: line_no + 1,
                reason: "expected '<index> <name>'".to_string(),
            });
        };
        labels.push(name.trim().to_string());
    }
    Ok(labels)
}

/// `"1"..="n"`
pub fn synthesize_labels(n: usize) -> Vec<String> {
    (1..=n).map(|i| i.to_string()).collect()
}

fn from_file(path: &Path, expected: usize) -> Option<Vec<String>> {
    match parse_label_file(path) {
        Ok(labels) if labels.len() == expected => Some(labels),
        Ok(labels) => {
            warn!(
                path = %path.display(),
                found = labels.len(),
                expected,
                "Label count does not match node count, ignoring label file"
            );
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read label file");
            None
        }
    }
}

/// Walk the label sources in priority order for `expected` nodes
pub(crate) fn resolve_labels(
    expected: usize,
    embedded: Option<Vec<String>>,
    reference: Option<&Path>,
    atlas_file: &Path,
) -> ResolvedLabels {
    let embedded = embedded.and_then(|labels| {
        if labels.len() == expected {
            Some(labels)
        } else {
            warn!(
                found = labels.len(),
                expected, "Atlas labels do not match node count, ignoring them"
            );
            None
        }
    });
    if let Some(labels) = embedded {
        return ResolvedLabels {
            labels,
            source: LabelSource::Embedded,
        };
    }

    if let Some(path) = reference.filter(|p| p.exists()) {
        if let Some(labels) = from_file(path, expected) {
            return ResolvedLabels {
                labels,
                source: LabelSource::Reference(path.to_path_buf()),
            };
        }
    }

    if atlas_file.exists() {
        if let Some(labels) = from_file(atlas_file, expected) {
            return ResolvedLabels {
                labels,
                source: LabelSource::AtlasFile(atlas_file.to_path_buf()),
            };
        }
    }

    debug!(count = expected, "Using numeric node labels");
    ResolvedLabels {
        labels: synthesize_labels(expected),
        source: LabelSource::Synthesized,
    }
}
