// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as URL shape and threshold ranges.

use thiserror::Error;

use crate::model::PoliteflowConfig;

/// A single configuration validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {message}")]
    Validation { message: String },
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PoliteflowConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.service.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "service.base_url must not be empty".to_string(),
        });
    } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("service.base_url `{base_url}` must start with http:// or https://"),
        });
    }

    if config.service.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "service.timeout_secs must be greater than zero".to_string(),
        });
    }

    if let Some(threshold) = config.experiment.fallback_threshold
        && !(0.0..=1.0).contains(&threshold)
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "experiment.fallback_threshold must be within [0, 1], got {threshold}"
            ),
        });
    }

    // A fallback mode without a threshold (or vice versa) is half a policy.
    match (
        config.experiment.fallback_mode,
        config.experiment.fallback_threshold,
    ) {
        (Some(_), None) => errors.push(ConfigError::Validation {
            message: "experiment.fallback_mode is set but experiment.fallback_threshold is not"
                .to_string(),
        }),
        (None, Some(_)) => errors.push(ConfigError::Validation {
            message: "experiment.fallback_threshold is set but experiment.fallback_mode is not"
                .to_string(),
        }),
        _ => {}
    }

    if let Some(path) = &config.identity.state_file
        && path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "identity.state_file must not be empty when set".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
