// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Rendering service trait.

Every method writes one file and returns its path. Workflows log render
errors and never propagate them.
*/

use crate::types::{GraphPlot, RenderResult};
use connectometry_estimation::SignalMatrix;
use std::path::{Path, PathBuf};

pub trait Renderer: Send + Sync {
    /// Circular graph document for interactive viewers
    fn connectogram(&self, plot: &GraphPlot<'_>, output: &Path) -> RenderResult<PathBuf>;

    /// Heatmap of the adjacency matrix
    fn adjacency_matrix(&self, plot: &GraphPlot<'_>, output: &Path) -> RenderResult<PathBuf>;

    /// Node time series, one trace per node
    fn timeseries(
        &self,
        signal: &SignalMatrix,
        labels: &[String],
        title: &str,
        output: &Path,
    ) -> RenderResult<PathBuf>;

    /// Graph projected onto an axial brain view
    fn connectome(&self, plot: &GraphPlot<'_>, output: &Path) -> RenderResult<PathBuf>;
}
