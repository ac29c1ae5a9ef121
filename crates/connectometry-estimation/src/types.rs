// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Error types for connectivity estimation.
*/

/// Result type for estimation operations
pub type EstimationResult<T> = Result<T, EstimationError>;

/// Errors raised while fitting or thresholding a connectivity matrix
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimationError {
    #[error("Degenerate input: {0}")]
    Degenerate(String),

    #[error("Matrix is singular")]
    Singular,

    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown connectivity model '{0}'")]
    UnknownModel(String),
}
