// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Politeflow workspace.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

use politeflow_core::types::PolicyMode;

/// Top-level Politeflow configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PoliteflowConfig {
    /// Experiment backend HTTP settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Fallback policy used only when the server is unreachable and no
    /// cached policy exists yet.
    #[serde(default)]
    pub experiment: ExperimentConfig,

    /// Local participant identity settings.
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Experiment backend HTTP settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Base URL of the experiment backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on transient status codes (429/500/503).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    1
}

/// Fallback policy configuration.
///
/// The server-provided policy is always authoritative; these values only
/// apply when the very first policy fetch fails and there is no
/// last-known-good cache entry. Leaving them unset makes the flow refuse to
/// submit instead of guessing.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    /// Fallback policy mode (`block`, `polite_one_edit`, `nofilter`).
    #[serde(default)]
    pub fallback_mode: Option<PolicyMode>,

    /// Fallback classifier threshold in [0, 1].
    #[serde(default)]
    pub fallback_threshold: Option<f64>,
}

/// Local participant identity settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Path of the file holding the locally generated user id.
    /// Defaults to `<XDG state dir>/politeflow/user_id`.
    #[serde(default)]
    pub state_file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = PoliteflowConfig::default();
        assert_eq!(config.service.base_url, "http://localhost:8000");
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.service.max_retries, 1);
        assert!(config.experiment.fallback_mode.is_none());
        assert!(config.identity.state_file.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<ServiceConfig, _> =
            serde_json::from_str(r#"{"base_url": "http://x", "typo_field": 1}"#);
        assert!(result.is_err());
    }
}
