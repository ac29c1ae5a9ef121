// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Service implementations.

Default implementations of the extraction and rendering traits. Tractography
has no bundled backend; callers provide their own `TractographyService`.
*/

pub mod image_renderer;
pub mod nifti_signal_extractor;

// Re-export for convenience
pub use image_renderer::{Connectogram, ConnectogramNode, ImageRenderer};
pub use nifti_signal_extractor::NiftiSignalExtractor;
