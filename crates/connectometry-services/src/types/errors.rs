// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Service layer error types.

`ServiceError` covers the extraction boundary, `RenderError` and
`TractographyError` the rendering and tractography boundaries, and
`PipelineError` everything a workflow can fail with. Only the two
prerequisite variants of `PipelineError` are fatal for a batch.
*/

use connectometry_estimation::EstimationError;
use connectometry_nodes::NodeError;
use connectometry_volume::VolumeError;
use std::path::PathBuf;
use thiserror::Error;

/// Signal extraction errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Volume could not be read or does not fit the request
    #[error("Volume error: {0}")]
    Volume(#[from] VolumeError),

    /// Numerical step failed (e.g. confound regression)
    #[error("Estimation error: {0}")]
    Estimation(#[from] EstimationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Rendering errors; callers log these and carry on
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot render: {0}")]
    InvalidInput(String),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Tractography errors
#[derive(Error, Debug)]
pub enum TractographyError {
    /// The tractography backend failed while running; the structural run
    /// reports no estimate instead of failing
    #[error("Tractography runtime failure: {0}")]
    Runtime(String),

    #[error("Invalid tractography input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TractographyResult<T> = Result<T, TractographyError>;

/// Workflow errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Adaptive thresholding needs a structural estimate that is not there
    #[error("No structural matrix found at {0}")]
    PrerequisiteMissing(PathBuf),

    /// The structural estimate path could not be checked
    #[error("Could not look up structural matrix {path}: {reason}")]
    PrerequisiteLookup { path: PathBuf, reason: String },

    /// Labels, nodes and signal columns disagree
    #[error("Alignment error: {0}")]
    Alignment(String),

    #[error("Invalid run parameters: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    Estimation(#[from] EstimationError),

    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Tractography(#[from] TractographyError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Fatal errors stop the whole batch, not just the current subject
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::PrerequisiteMissing(_) | PipelineError::PrerequisiteLookup { .. }
        )
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_prerequisite_errors_are_fatal() {
        assert!(PipelineError::PrerequisiteMissing(PathBuf::from("x")).is_fatal());
        assert!(PipelineError::PrerequisiteLookup {
            path: PathBuf::from("x"),
            reason: "denied".into()
        }
        .is_fatal());
        assert!(!PipelineError::Alignment("3 labels, 4 nodes".into()).is_fatal());
        assert!(!PipelineError::from(EstimationError::Singular).is_fatal());
        assert!(!PipelineError::from(TractographyError::Runtime("probtrackx".into())).is_fatal());
    }
}
