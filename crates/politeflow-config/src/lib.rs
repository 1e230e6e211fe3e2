// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Politeflow workspace.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and local participant identity management.
//!
//! # Usage
//!
//! ```no_run
//! use politeflow_config::{Identity, load_and_validate};
//!
//! let config = load_and_validate().expect("config errors");
//! let identity = Identity::load_or_generate(&config.identity).expect("identity");
//! println!("backend: {}, user: {}", config.service.base_url, identity.user_id.0);
//! ```

pub mod identity;
pub mod loader;
pub mod model;
pub mod validation;

pub use identity::Identity;
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::PoliteflowConfig;
pub use validation::ConfigError;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point: loads config from TOML files plus
/// env vars via Figment, then runs post-deserialization validation.
pub fn load_and_validate() -> Result<PoliteflowConfig, Vec<ConfigError>> {
    let config = loader::load_config().map_err(|err| {
        vec![ConfigError::Validation {
            message: err.to_string(),
        }]
    })?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<PoliteflowConfig, Vec<ConfigError>> {
    let config = loader::load_config_from_str(toml_content).map_err(|err| {
        vec![ConfigError::Validation {
            message: err.to_string(),
        }]
    })?;
    validation::validate_config(&config)?;
    Ok(config)
}
