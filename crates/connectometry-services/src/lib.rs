// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Connectometry Service Layer

Per-subject workflows and the service boundaries they depend on.

## Architecture

```text
┌─────────────────────────────────────────────────────────────────┐
│                         BATCH RUNNER                             │
│  sequential runs, process exit on fatal errors                   │
└────────────────────────────┬────────────────────────────────────┘
                             ↓
┌─────────────────────────────────────────────────────────────────┐
│                 WORKFLOWS (Pipeline)                             │
│  resolve → select → mask → persist → build matrix → threshold    │
└────────────────────────────┬────────────────────────────────────┘
                             ↓
┌─────────────────────────────────────────────────────────────────┐
│                    SERVICE TRAITS                                │
│  • SignalExtractor      - per-node signals from a 4-D volume     │
│  • Renderer             - connectogram, heatmap, plots           │
│  • TractographyService  - structural matrix (no bundled backend) │
└────────────────────────────┬────────────────────────────────────┘
                             ↓
┌─────────────────────────────────────────────────────────────────┐
│                   DOMAIN LAYER                                   │
│  connectometry-nodes, connectometry-estimation,                  │
│  connectometry-volume                                            │
└─────────────────────────────────────────────────────────────────┘
```

## Usage

```no_run
use connectometry_services::{FunctionalRun, ImageRenderer, NiftiSignalExtractor, Pipeline,
    PipelineSettings};
use std::sync::Arc;

# fn demo(run: FunctionalRun) -> connectometry_services::PipelineResult<()> {
let settings = PipelineSettings::default();
let pipeline = Pipeline::new(
    settings.clone(),
    Arc::new(NiftiSignalExtractor::new()),
    Arc::new(ImageRenderer::new(settings.plotting)),
);
let result = pipeline.run_functional(&run)?;
println!("{} ({})", result.estimate_path.display(), result.edge_threshold);
# Ok(())
# }
```
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod artifacts;
pub mod batch;
pub mod impls;
pub mod paths;
pub mod traits;
pub mod types;
pub mod workflows;

pub use artifacts::{ArtifactWriter, GraphArtifacts};
pub use batch::{BatchReport, BatchRun, BatchRunner, RunOutcome, FATAL_EXIT_CODE};
pub use impls::{Connectogram, ConnectogramNode, ImageRenderer, NiftiSignalExtractor};
pub use paths::OutputPaths;
pub use traits::{Renderer, SignalExtractor, TractographyService};
pub use types::*;
pub use workflows::structural::BRAIN_MASK_FILE;
pub use workflows::Pipeline;
