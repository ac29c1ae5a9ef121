// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Connectometry Volumes

Voxel grids, world/voxel coordinate mapping and the file formats the pipeline
reads and writes:

- NIfTI-1 volumes (`.nii`, `.nii.gz`) for atlases, masks, templates and
  functional series
- whitespace-delimited text matrices for time series and connectivity estimates

Coordinates are world-space millimetres unless a name says otherwise.
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod affine;
pub mod nifti_io;
pub mod text_io;
pub mod volume;

pub use affine::{Affine, VoxelGrid, VoxelIndex, WorldCoordinate};
pub use nifti_io::{is_volume_path, read_series, read_volume, write_volume};
pub use text_io::{read_matrix, write_matrix};
pub use volume::{SeriesVolume, Volume};

/// Result type for volume operations
pub type VolumeResult<T> = Result<T, VolumeError>;

/// Errors that can occur while loading, mapping or saving volumes
#[derive(Debug, thiserror::Error)]
pub enum VolumeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NIfTI error in {path}: {reason}")]
    Nifti { path: String, reason: String },

    #[error("Unsupported volume shape {shape:?} in {path}")]
    UnsupportedShape { path: String, shape: Vec<usize> },

    #[error("Affine is not invertible")]
    SingularAffine,

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Parse error in {path} at line {line}: {reason}")]
    Parse {
        path: String,
        line: usize,
        reason: String,
    },
}
