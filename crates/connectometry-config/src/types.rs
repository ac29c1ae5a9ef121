// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `connectometry.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectometryConfig {
    pub atlas: AtlasConfig,
    pub extraction: ExtractionConfig,
    pub thresholding: ThresholdingConfig,
    pub plotting: PlottingConfig,
    pub logging: LoggingConfig,
}

/// Atlas catalog and network template locations
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Directory holding the packaged atlases, label files and templates
    pub data_dir: PathBuf,
    /// File name (inside `data_dir`) of the 7-network template volume
    pub network_template: String,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("atlases"),
            network_template: "yeo7_networks.nii.gz".to_string(),
        }
    }
}

/// Per-node signal extraction
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Sphere radius in millimetres for coordinate nodes
    pub node_radius: f64,
    /// Z-score each extracted time series
    pub standardize: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            node_radius: 4.0,
            standardize: true,
        }
    }
}

/// Search parameters for the density and adaptive thresholding policies
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThresholdingConfig {
    /// Increment of the absolute cutoff while searching for a target density
    pub density_step: f64,
    /// Highest absolute cutoff tried by the density search
    pub density_max_threshold: f64,
    /// Increment of the proportional threshold swept by adaptive thresholding
    pub adaptive_step: f64,
}

impl Default for ThresholdingConfig {
    fn default() -> Self {
        Self {
            density_step: 0.01,
            density_max_threshold: 0.5,
            adaptive_step: 0.01,
        }
    }
}

/// Rendering switches
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlottingConfig {
    pub enabled: bool,
    /// Graphs with fewer nodes than this skip the connectogram
    pub min_connectogram_nodes: usize,
    /// Edge length in pixels of square PNG outputs
    pub image_size: u32,
}

impl Default for PlottingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_connectogram_nodes: 20,
            image_size: 600,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: PathBuf,
    pub file_logging: bool,
    pub retention_days: u64,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            file_logging: false,
            retention_days: 30,
            retention_runs: 10,
        }
    }
}

impl LoggingConfig {
    /// Log levels accepted by the `tracing` filter
    pub const LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
}
