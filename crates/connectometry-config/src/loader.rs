// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, ConnectometryConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "connectometry.toml";

/// Find the connectometry configuration file
///
/// Search order:
/// 1. `CONNECTOMETRY_CONFIG_PATH` environment variable
/// 2. Current working directory: `./connectometry.toml`
/// 3. Parent directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("CONNECTOMETRY_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by CONNECTOMETRY_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet CONNECTOMETRY_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file
///   and fall back to built-in defaults when none exists.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if an explicit config file is missing or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<ConnectometryConfig> {
    let mut config = match config_path {
        Some(path) => read_config_file(path)?,
        None => match find_config_file() {
            Ok(path) => read_config_file(&path)?,
            Err(ConfigError::FileNotFound(_)) if env::var("CONNECTOMETRY_CONFIG_PATH").is_err() => {
                ConnectometryConfig::default()
            }
            Err(e) => return Err(e),
        },
    };

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn read_config_file(path: &Path) -> ConfigResult<ConnectometryConfig> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn parse_flag(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower == "true" || lower == "1" || lower == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `CONNECTOMETRY_ATLAS_DIR` -> `atlas.data_dir`
/// - `CONNECTOMETRY_NETWORK_TEMPLATE` -> `atlas.network_template`
/// - `CONNECTOMETRY_NODE_RADIUS` -> `extraction.node_radius`
/// - `CONNECTOMETRY_STANDARDIZE` -> `extraction.standardize`
/// - `CONNECTOMETRY_PLOT` -> `plotting.enabled`
/// - `CONNECTOMETRY_LOG_LEVEL` -> `logging.level`
/// - `CONNECTOMETRY_LOG_DIR` -> `logging.log_dir`
pub fn apply_environment_overrides(config: &mut ConnectometryConfig) {
    if let Ok(value) = env::var("CONNECTOMETRY_ATLAS_DIR") {
        config.atlas.data_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("CONNECTOMETRY_NETWORK_TEMPLATE") {
        config.atlas.network_template = value;
    }

    if let Ok(value) = env::var("CONNECTOMETRY_NODE_RADIUS") {
        if let Ok(radius) = value.parse::<f64>() {
            config.extraction.node_radius = radius;
        }
    }
    if let Ok(value) = env::var("CONNECTOMETRY_STANDARDIZE") {
        config.extraction.standardize = parse_flag(&value);
    }

    if let Ok(value) = env::var("CONNECTOMETRY_PLOT") {
        config.plotting.enabled = parse_flag(&value);
    }

    if let Ok(value) = env::var("CONNECTOMETRY_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("CONNECTOMETRY_LOG_DIR") {
        config.logging.log_dir = PathBuf::from(value);
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"atlas_dir": "/data/atlases", "node_radius": "6"}`)
pub fn apply_cli_overrides(config: &mut ConnectometryConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("atlas_dir") {
        config.atlas.data_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("network_template") {
        config.atlas.network_template = value.clone();
    }

    if let Some(value) = cli_args.get("node_radius") {
        if let Ok(radius) = value.parse::<f64>() {
            config.extraction.node_radius = radius;
        }
    }

    if let Some(value) = cli_args.get("plot") {
        config.plotting.enabled = parse_flag(value);
    }

    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("log_dir") {
        config.logging.log_dir = PathBuf::from(value);
    }
}
