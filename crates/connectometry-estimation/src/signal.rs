// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{EstimationError, EstimationResult};
use ndarray::Array2;

/// Observations × nodes matrix; column `j` belongs to node `j` of the node set
#[derive(Debug, Clone, PartialEq)]
pub struct SignalMatrix {
    data: Array2<f64>,
}

impl SignalMatrix {
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }

    pub fn observations(&self) -> usize {
        self.data.nrows()
    }

    pub fn nodes(&self) -> usize {
        self.data.ncols()
    }

    /// Check the column count against the node set size
    pub fn ensure_nodes(&self, expected: usize) -> EstimationResult<()> {
        if self.nodes() != expected {
            return Err(EstimationError::DimensionMismatch {
                expected: (self.observations(), expected),
                actual: self.data.dim(),
            });
        }
        Ok(())
    }
}
