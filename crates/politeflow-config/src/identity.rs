// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locally generated participant identity.
//!
//! The experiment uses pseudo-authentication: an opaque user id generated on
//! first use and persisted to a local state file. The id is an explicit
//! object injected into the flow controller at construction, never an
//! ambient global lookup.

use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::debug;

use politeflow_core::PoliteflowError;
use politeflow_core::types::UserId;

use crate::model::IdentityConfig;

/// Alphabet for generated user ids (base36, matching `u_xxxxxxxx`).
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 8;

/// Resolved participant identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
}

impl Identity {
    /// Loads the persisted user id, or generates and persists a fresh one.
    ///
    /// The state file path comes from `identity.state_file`, defaulting to
    /// `<XDG state dir>/politeflow/user_id`.
    pub fn load_or_generate(config: &IdentityConfig) -> Result<Self, PoliteflowError> {
        let path = state_file_path(config)?;
        Self::load_or_generate_at(&path)
    }

    /// Loads or generates an identity at an explicit path.
    pub fn load_or_generate_at(path: &Path) -> Result<Self, PoliteflowError> {
        if let Ok(existing) = std::fs::read_to_string(path) {
            let trimmed = existing.trim();
            if !trimmed.is_empty() {
                debug!(user_id = trimmed, "loaded persisted identity");
                return Ok(Self {
                    user_id: UserId(trimmed.to_string()),
                });
            }
        }

        let user_id = generate_user_id();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PoliteflowError::Config(format!(
                    "cannot create identity state dir {}: {e}",
                    parent.display()
                ))
            })?;
        }
        std::fs::write(path, &user_id.0).map_err(|e| {
            PoliteflowError::Config(format!(
                "cannot persist identity to {}: {e}",
                path.display()
            ))
        })?;
        debug!(user_id = user_id.0.as_str(), "generated new identity");
        Ok(Self { user_id })
    }
}

/// Generates an opaque `u_` + 8 base36 character user id.
fn generate_user_id() -> UserId {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    UserId(format!("u_{suffix}"))
}

fn state_file_path(config: &IdentityConfig) -> Result<PathBuf, PoliteflowError> {
    if let Some(path) = &config.state_file {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .ok_or_else(|| {
            PoliteflowError::Config("no XDG state directory available for identity".to_string())
        })?;
    Ok(base.join("politeflow/user_id"))
}
