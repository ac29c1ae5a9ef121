// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Error types for node definition.
*/

use connectometry_volume::VolumeError;
use std::path::PathBuf;

/// Result type for node operations
pub type NodeResult<T> = Result<T, NodeError>;

/// Errors that can occur while resolving, selecting or masking nodes
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("Unknown atlas '{0}' and no atlas file given")]
    UnknownAtlas(String),

    #[error("Neither an atlas name nor an atlas file was given")]
    NoAtlasSpecified,

    #[error("Atlas file not found: {0}")]
    MissingAtlasFile(PathBuf),

    #[error("Unsupported atlas file type: {0}")]
    UnsupportedSource(PathBuf),

    #[error("Invalid atlas request: {0}")]
    InvalidRequest(String),

    #[error("Atlas '{0}' contains no nodes")]
    EmptyAtlas(String),

    #[error("Unknown network '{0}'")]
    UnknownNetwork(String),

    #[error("Node geometry does not match node set layout: {0}")]
    LayoutMismatch(String),

    #[error("Parse error in {path} at line {line}: {reason}")]
    Parse {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Volume error: {0}")]
    Volume(#[from] VolumeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
