// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./politeflow.toml` >
//! `~/.config/politeflow/politeflow.toml` > `/etc/politeflow/politeflow.toml`
//! with environment variable overrides via the `POLITEFLOW_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PoliteflowConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/politeflow/politeflow.toml` (system-wide)
/// 3. `~/.config/politeflow/politeflow.toml` (user XDG config)
/// 4. `./politeflow.toml` (local directory)
/// 5. `POLITEFLOW_*` environment variables
pub fn load_config() -> Result<PoliteflowConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PoliteflowConfig::default()))
        .merge(Toml::file("/etc/politeflow/politeflow.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("politeflow/politeflow.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("politeflow.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PoliteflowConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PoliteflowConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PoliteflowConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PoliteflowConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// key names stay unambiguous: `POLITEFLOW_SERVICE_BASE_URL` must map to
/// `service.base_url`, not `service.base.url`.
fn env_provider() -> Env {
    Env::prefixed("POLITEFLOW_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("experiment_", "experiment.", 1)
            .replacen("identity_", "identity.", 1);
        mapped.into()
    })
}
