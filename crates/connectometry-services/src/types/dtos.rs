// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Request, parameter and result types passed across the service boundary.
*/

use connectometry_config::ConnectometryConfig;
use connectometry_estimation::{ConnectivityModel, ThresholdConfig, ThresholdSettings};
use connectometry_nodes::{AtlasRequest, Network, NodeSet};
use connectometry_volume::WorldCoordinate;
use ndarray::Array2;
use std::path::{Path, PathBuf};

// ============================================================================
// SERVICE REQUESTS
// ============================================================================

/// Per-node signal extraction from a 4-D volume
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    pub input: &'a Path,
    pub nodes: &'a NodeSet,
    /// Sphere radius in mm for coordinate nodes
    pub node_radius: f64,
    /// Text matrix of confound regressors (time points × regressors)
    pub confounds: Option<&'a Path>,
    /// Z-score each node's signal
    pub standardize: bool,
}

/// Everything a renderer needs to draw one graph
#[derive(Debug, Clone, Copy)]
pub struct GraphPlot<'a> {
    pub matrix: &'a Array2<f64>,
    pub labels: &'a [String],
    pub coordinates: &'a [WorldCoordinate],
    pub title: &'a str,
    /// `None` for structural graphs
    pub model: Option<ConnectivityModel>,
    /// Percent string, e.g. `"50.0%"`
    pub edge_threshold: &'a str,
}

/// Structural connectome estimation for one node set
#[derive(Debug, Clone, Copy)]
pub struct StructuralRequest<'a> {
    pub subject_id: &'a str,
    /// Diffusion model directory (holds `nodif_brain_mask.nii.gz`)
    pub diffusion_dir: &'a Path,
    pub network: Option<Network>,
    pub nodes: &'a NodeSet,
    pub node_radius: f64,
    pub anatomical: Option<&'a Path>,
    pub threads: usize,
    pub output_dir: &'a Path,
    /// Binary per-parcel volumes, empty for coordinate nodes
    pub region_volumes: &'a [PathBuf],
    /// Where the estimated matrix is to be written
    pub estimate_path: &'a Path,
    /// Backends may emit their own diagnostic figures when set
    pub plot: bool,
}

/// Masks produced by [`crate::TractographyService::prepare_masks`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedMasks {
    /// One seed mask per node, in node order
    pub seeds: Vec<PathBuf>,
    /// Ventricle/CSF avoidance mask in diffusion space
    pub exclusion: Option<PathBuf>,
    /// White-matter waypoint mask in diffusion space
    pub waypoint: Option<PathBuf>,
}

// ============================================================================
// WORKFLOW PARAMETERS
// ============================================================================

/// One functional connectometry run (whole-brain when `network` is `None`)
#[derive(Debug, Clone)]
pub struct FunctionalRun {
    pub subject_id: String,
    /// 4-D functional volume
    pub input: PathBuf,
    pub atlas: AtlasRequest,
    pub network: Option<Network>,
    pub mask: Option<PathBuf>,
    pub threshold: ThresholdConfig,
    pub model: ConnectivityModel,
    pub node_radius: f64,
    pub confounds: Option<PathBuf>,
    pub plot: bool,
}

/// One structural connectometry run
#[derive(Debug, Clone)]
pub struct StructuralRun {
    pub subject_id: String,
    pub diffusion_dir: PathBuf,
    pub network: Option<Network>,
    pub node_radius: f64,
    pub atlas: AtlasRequest,
    pub plot: bool,
    pub anatomical: Option<PathBuf>,
    pub threads: usize,
    pub mask: Option<PathBuf>,
}

/// Final product of a functional run
#[derive(Debug, Clone)]
pub struct ThresholdResult {
    /// Symmetric, zero diagonal, entries in `[0, 1]`
    pub matrix: Array2<f64>,
    pub estimate_path: PathBuf,
    /// Percent string used only for rendering
    pub edge_threshold: String,
    /// Threshold actually applied
    pub effective_threshold: f64,
    pub output_dir: PathBuf,
    pub labels: Vec<String>,
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Rendering knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotSettings {
    /// Connectograms of smaller graphs are skipped
    pub min_connectogram_nodes: usize,
    /// Edge length of square images in pixels
    pub image_size: u32,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            min_connectogram_nodes: 20,
            image_size: 600,
        }
    }
}

/// Run-independent pipeline settings, usually derived from the configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub atlas_dir: PathBuf,
    /// Yeo 7-network template, absolute or relative to `atlas_dir`
    pub network_template: PathBuf,
    pub standardize: bool,
    pub thresholds: ThresholdSettings,
    pub plotting: PlotSettings,
}

impl PipelineSettings {
    pub fn network_template_path(&self) -> PathBuf {
        if self.network_template.is_absolute() {
            self.network_template.clone()
        } else {
            self.atlas_dir.join(&self.network_template)
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&ConnectometryConfig::default())
    }
}

impl From<&ConnectometryConfig> for PipelineSettings {
    fn from(config: &ConnectometryConfig) -> Self {
        Self {
            atlas_dir: config.atlas.data_dir.clone(),
            network_template: PathBuf::from(&config.atlas.network_template),
            standardize: config.extraction.standardize,
            thresholds: ThresholdSettings {
                density_step: config.thresholding.density_step,
                density_ceiling: config.thresholding.density_max_threshold,
                adaptive_step: config.thresholding.adaptive_step,
            },
            plotting: PlotSettings {
                min_connectogram_nodes: config.plotting.min_connectogram_nodes,
                image_size: config.plotting.image_size,
            },
        }
    }
}
