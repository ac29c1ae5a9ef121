// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::types::{ExtractionRequest, ServiceResult};
use connectometry_estimation::SignalMatrix;

/// Per-node signal extraction
pub trait SignalExtractor: Send + Sync {
    /// Extract one column per node of `request.nodes`, in node order
    ///
    /// # Errors
    /// * `ServiceError::InvalidInput` - empty node set or mismatched confounds
    /// * `ServiceError::Volume` - input could not be read
    fn extract(&self, request: &ExtractionRequest<'_>) -> ServiceResult<SignalMatrix>;
}
