// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connectometry command line tool

Runs one functional connectometry workflow (whole-brain, or one network with
`--network`) for one subject.

Usage:
  cargo run --bin connectometry -- --input sub-997/func.nii.gz --id 997 --atlas coords_power_2011

Debug logging per crate:
  cargo run --bin connectometry -- ... --debug-connectometry-nodes
*/

use anyhow::{bail, Context, Result};
use clap::Parser;
use connectometry::config::{load_config, validate_config, ConnectometryConfig};
use connectometry::estimation::{ConnectivityModel, ThresholdConfig};
use connectometry::nodes::{AtlasRequest, Network};
use connectometry::observability::{init_logging, parse_debug_flags, LoggingOptions};
use connectometry::services::{
    BatchRun, BatchRunner, FunctionalRun, ImageRenderer, NiftiSignalExtractor, Pipeline,
    PipelineSettings, RunOutcome,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "connectometry", version, author, long_about = None)]
struct Args {
    /// 4-D functional volume (.nii or .nii.gz)
    #[arg(short, long)]
    input: PathBuf,

    /// Subject identifier used in every output file name
    #[arg(long = "id")]
    subject_id: String,

    /// Catalog atlas name (e.g. atlas_aal, coords_power_2011)
    #[arg(short, long)]
    atlas: Option<String>,

    /// User-supplied atlas: label volume or coordinate list
    #[arg(long)]
    atlas_file: Option<PathBuf>,

    /// Reference label file with `index name` rows
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Use parcels rather than coordinates as nodes
    #[arg(long, default_value_t = false)]
    parcellated: bool,

    /// Restrict nodes to one of the 7 resting-state networks
    #[arg(short, long)]
    network: Option<String>,

    /// Binary region-of-interest mask
    #[arg(short, long)]
    mask: Option<PathBuf>,

    /// Proportion of strongest edges to keep
    #[arg(long, default_value_t = 0.95)]
    thr: f64,

    /// Target edge density; selects density thresholding
    #[arg(long)]
    dens_thresh: Option<f64>,

    /// Threshold against the subject's structural estimate
    #[arg(long, default_value_t = false)]
    adapt_thresh: bool,

    /// Connectivity model: corr, partcorr, cov or prec
    #[arg(long, default_value = "corr")]
    model: String,

    /// Sphere radius in mm for coordinate nodes (overrides config)
    #[arg(long)]
    node_radius: Option<f64>,

    /// Confound regressors, one row per time point
    #[arg(long)]
    confounds: Option<PathBuf>,

    /// Render plots (overrides config)
    #[arg(long, default_value_t = false)]
    plot: bool,

    /// Configuration file (default: search for connectometry.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Atlas data directory (overrides config)
    #[arg(long)]
    atlas_dir: Option<PathBuf>,

    /// Log level (overrides config)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(dir) = &self.atlas_dir {
            overrides.insert("atlas_dir".to_string(), dir.display().to_string());
        }
        if let Some(radius) = self.node_radius {
            overrides.insert("node_radius".to_string(), radius.to_string());
        }
        if self.plot {
            overrides.insert("plot".to_string(), "true".to_string());
        }
        if let Some(level) = &self.log_level {
            overrides.insert("log_level".to_string(), level.clone());
        }
        overrides
    }

    fn functional_run(&self, config: &ConnectometryConfig) -> Result<FunctionalRun> {
        let network = self
            .network
            .as_deref()
            .map(str::parse::<Network>)
            .transpose()?;
        let model: ConnectivityModel = self.model.parse()?;
        Ok(FunctionalRun {
            subject_id: self.subject_id.clone(),
            input: self.input.clone(),
            atlas: AtlasRequest {
                atlas: self.atlas.clone(),
                source_file: self.atlas_file.clone(),
                reference_labels: self.labels.clone(),
                parcellated: self.parcellated,
            },
            network,
            mask: self.mask.clone(),
            threshold: ThresholdConfig::new(self.thr, self.dens_thresh, self.adapt_thresh)?,
            model,
            node_radius: config.extraction.node_radius,
            confounds: self.confounds.clone(),
            plot: config.plotting.enabled,
        })
    }
}

fn main() -> Result<()> {
    // --debug-* flags belong to the logging setup, not to clap
    let debug_flags = parse_debug_flags();
    let args = Args::parse_from(std::env::args().filter(|a| !a.starts_with("--debug-")));

    let overrides = args.overrides();
    let config = load_config(args.config.as_deref(), Some(&overrides))
        .context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;

    let logging = LoggingOptions {
        level: config.logging.level.clone(),
        log_dir: config
            .logging
            .file_logging
            .then(|| config.logging.log_dir.clone()),
        retention_days: Some(config.logging.retention_days),
        retention_runs: Some(config.logging.retention_runs),
    };
    let _guard = init_logging(&debug_flags, &logging)?;

    info!("Connectometry {}", connectometry::VERSION);
    let run = args.functional_run(&config)?;

    let settings = PipelineSettings::from(&config);
    let pipeline = Pipeline::new(
        settings.clone(),
        Arc::new(NiftiSignalExtractor::new()),
        Arc::new(ImageRenderer::new(settings.plotting)),
    );

    let report = BatchRunner::new(&pipeline).run(&[BatchRun::Functional(run)]);
    for outcome in &report.outcomes {
        match outcome {
            RunOutcome::Functional(result) => info!(
                "Wrote {} (edge threshold {}, effective {})",
                result.estimate_path.display(),
                result.edge_threshold,
                result.effective_threshold
            ),
            RunOutcome::Structural(_) => {}
            RunOutcome::Failed { subject_id, error } => {
                error!("Subject {} failed: {}", subject_id, error)
            }
        }
    }

    if report.failures() > 0 {
        bail!("{} run(s) failed", report.failures());
    }
    Ok(())
}
