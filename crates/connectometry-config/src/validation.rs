// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures configuration values are within valid ranges and consistent with
//! each other before a pipeline run starts.

use crate::{ConfigError, ConfigResult, ConnectometryConfig, LoggingConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Required fields
/// - Valid value ranges for thresholding search parameters
/// - Known log levels
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &ConnectometryConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_required_fields(config, &mut errors);
    validate_value_ranges(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_required_fields(config: &ConnectometryConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.atlas.data_dir.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "atlas.data_dir".to_string(),
        });
    }
    if config.atlas.network_template.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "atlas.network_template".to_string(),
        });
    }
}

fn validate_step(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !(value > 0.0 && value <= 1.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: field.to_string(),
            reason: "must be in (0.0, 1.0]".to_string(),
        });
    }
}

fn validate_value_ranges(config: &ConnectometryConfig, errors: &mut Vec<ConfigValidationError>) {
    if !(config.extraction.node_radius > 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "extraction.node_radius".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    validate_step("thresholding.density_step", config.thresholding.density_step, errors);
    validate_step("thresholding.adaptive_step", config.thresholding.adaptive_step, errors);

    let ceiling = config.thresholding.density_max_threshold;
    if !(0.0..=1.0).contains(&ceiling) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "thresholding.density_max_threshold".to_string(),
            reason: "must be between 0.0 and 1.0".to_string(),
        });
    }

    if config.plotting.image_size < 64 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "plotting.image_size".to_string(),
            reason: "must be at least 64 pixels".to_string(),
        });
    }

    let level = config.logging.level.to_lowercase();
    if !LoggingConfig::LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("must be one of {}", LoggingConfig::LEVELS.join(", ")),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ConnectometryConfig::default();
        let result = validate_config(&config);
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let mut config = ConnectometryConfig::default();
        config.atlas.network_template = String::new();

        let result = validate_config(&config);
        match result {
            Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("atlas.network_template")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_density_step() {
        let mut config = ConnectometryConfig::default();
        config.thresholding.density_step = 0.0;

        match validate_config(&config) {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains("thresholding.density_step"));
                assert!(msg.contains("(0.0, 1.0]"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_all_problems_are_reported_together() {
        let mut config = ConnectometryConfig::default();
        config.extraction.node_radius = -1.0;
        config.logging.level = "verbose".to_string();

        match validate_config(&config) {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains("extraction.node_radius"));
                assert!(msg.contains("logging.level"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
