// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Service trait definitions.

These traits are the boundary between the workflows and the collaborators
that touch imaging data: signal extraction, rendering and tractography.
*/

pub mod renderer;
pub mod signal_extractor;
pub mod tractography;

// Re-export for convenience
pub use renderer::Renderer;
pub use signal_extractor::SignalExtractor;
pub use tractography::TractographyService;
