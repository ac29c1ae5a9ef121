// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Types for the service layer.
*/

pub mod dtos;
pub mod errors;

// Re-export for convenience
pub use dtos::*;
pub use errors::{
    PipelineError, PipelineResult, RenderError, RenderResult, ServiceError, ServiceResult,
    TractographyError, TractographyResult,
};
