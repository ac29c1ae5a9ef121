// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::types::{PreparedMasks, StructuralRequest, TractographyResult};
use std::path::PathBuf;

/// Probabilistic tractography backend
pub trait TractographyService: Send + Sync {
    /// Build seed, avoidance and waypoint masks for the request's nodes
    fn prepare_masks(&self, request: &StructuralRequest<'_>) -> TractographyResult<PreparedMasks>;

    /// Run tractography and write the node-by-node streamline matrix to
    /// `request.estimate_path`, returning the written path
    ///
    /// # Errors
    /// * `TractographyError::Runtime` - backend failure; the structural run
    ///   logs it and reports no estimate
    fn run_struct_mapping(
        &self,
        request: &StructuralRequest<'_>,
        masks: &PreparedMasks,
    ) -> TractographyResult<PathBuf>;
}
