// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Range and presence checks that need no knowledge of the neuron models.
//! Selector strings are only checked for presence; the runtime rejects
//! unknown names when it parses them.

use crate::{ConfigError, ConfigResult, NeurogradConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
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
/// Every violation is collected before returning, so one call reports all of
/// them.
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing each violation
pub fn validate_config(config: &NeurogradConfig) -> ConfigResult<()> {
    let errors = collect_violations(config);

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

/// All violations in `config`, in section order
pub fn collect_violations(config: &NeurogradConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_required_fields(config, &mut errors);
    validate_neuron(config, &mut errors);
    validate_surrogate(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn validate_required_fields(config: &NeurogradConfig, errors: &mut Vec<ConfigValidationError>) {
    let required = [
        ("neuron.model", &config.neuron.model),
        ("surrogate.name", &config.surrogate.name),
        ("execution.precision", &config.execution.precision),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: field.to_string(),
            });
        }
    }
}

fn validate_neuron(config: &NeurogradConfig, errors: &mut Vec<ConfigValidationError>) {
    let neuron = &config.neuron;

    if !neuron.v_threshold.is_finite() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "neuron.v_threshold".to_string(),
            reason: format!("must be finite, got {}", neuron.v_threshold),
        });
    }

    if let Some(v_reset) = neuron.v_reset {
        if !v_reset.is_finite() {
            errors.push(ConfigValidationError::InvalidValue {
                field: "neuron.v_reset".to_string(),
                reason: format!("must be finite, got {}", v_reset),
            });
        }
    }

    // reciprocal_tau = 1 / tau must land in (0, 1]
    if !(neuron.tau.is_finite() && neuron.tau >= 1.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "neuron.tau".to_string(),
            reason: format!("must be finite and >= 1.0, got {}", neuron.tau),
        });
    }
}

fn validate_surrogate(config: &NeurogradConfig, errors: &mut Vec<ConfigValidationError>) {
    if let Some(alpha) = config.surrogate.alpha {
        if !(alpha.is_finite() && alpha > 0.0) {
            errors.push(ConfigValidationError::InvalidValue {
                field: "surrogate.alpha".to_string(),
                reason: format!("must be positive, got {}", alpha),
            });
        }
    }
}

fn validate_logging(config: &NeurogradConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("expected one of {:?}, got {:?}", LOG_LEVELS, config.logging.level),
        });
    }
}
