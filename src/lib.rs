// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Connectometry
//!
//! Brain connectivity graphs ("connectomes") from neuroimaging data. Given a
//! functional or diffusion MRI volume, an atlas and thresholding parameters,
//! the pipeline derives graph nodes, builds a node-by-node matrix, thresholds
//! and normalizes it, and writes the graph artifacts to disk.
//!
//! ## Pipeline
//!
//! ```text
//! Atlas Resolver → Node Selector (per network) → Spatial Masker (optional)
//!     → Signal extraction / tractography → Estimator & Thresholder
//!     → Artifact Writer
//! ```
//!
//! ## Crates
//!
//! - **config**: TOML configuration with environment and CLI overrides
//! - **observability**: `tracing` setup, per-crate debug flags, JSON log files
//! - **volume**: voxel grids, NIfTI and text-matrix I/O
//! - **nodes**: atlas catalog and resolver, network selector, spatial masker
//! - **estimation**: connectivity models, thresholding policies, normalization
//! - **services**: extraction, rendering and tractography boundaries plus
//!   the functional and structural workflows
//!
//! ## Usage
//!
//! ```rust,no_run
//! use connectometry::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = PipelineSettings::default();
//! let pipeline = Pipeline::new(
//!     settings.clone(),
//!     Arc::new(NiftiSignalExtractor::new()),
//!     Arc::new(ImageRenderer::new(settings.plotting)),
//! );
//!
//! let run = FunctionalRun {
//!     subject_id: "997".to_string(),
//!     input: "sub-997/func.nii.gz".into(),
//!     atlas: AtlasRequest {
//!         atlas: Some("coords_power_2011".to_string()),
//!         ..AtlasRequest::default()
//!     },
//!     network: Some(Network::Default),
//!     mask: None,
//!     threshold: ThresholdConfig::new(0.5, None, false)?,
//!     model: ConnectivityModel::Corr,
//!     node_radius: 4.0,
//!     confounds: None,
//!     plot: true,
//! };
//! let result = pipeline.run_functional(&run)?;
//! println!("{} at {}", result.estimate_path.display(), result.edge_threshold);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Apache-2.0

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export foundation
pub use connectometry_config as config;
pub use connectometry_observability as observability;

// Re-export data and algorithms
pub use connectometry_estimation as estimation;
pub use connectometry_nodes as nodes;
pub use connectometry_volume as volume;

// Re-export service layer
pub use connectometry_services as services;

/// Prelude with the types most runs need
pub mod prelude {
    pub use crate::config::{load_config, ConnectometryConfig};
    pub use crate::estimation::{
        ConnectivityModel, SignalMatrix, ThresholdConfig, ThresholdPolicy, ThresholdSettings,
    };
    pub use crate::nodes::{AtlasRequest, Network, NodeSet};
    pub use crate::services::{
        BatchRun, BatchRunner, FunctionalRun, ImageRenderer, NiftiSignalExtractor, OutputPaths,
        Pipeline, PipelineError, PipelineResult, PipelineSettings, Renderer, SignalExtractor,
        StructuralRun, ThresholdResult, TractographyService,
    };
}
