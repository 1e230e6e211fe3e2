// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local claim bookkeeping.
//!
//! A small JSON-file-backed ledger holding, per (post, user) pair, whether
//! the reward was claimed and whether the one-shot eligibility popup has
//! already been shown. Write-through on every mutation; a missing file is an
//! empty ledger.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use politeflow_core::PoliteflowError;
use politeflow_core::types::{PostId, UserId};

/// Per-(post, user) claim state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEntry {
    #[serde(default)]
    pub claimed: bool,
    /// RFC 3339 claim timestamp.
    #[serde(default)]
    pub claimed_at: Option<String>,
    #[serde(default)]
    pub popup_shown: bool,
}

/// File-backed claim ledger.
#[derive(Debug)]
pub struct ClaimLedger {
    path: PathBuf,
    entries: BTreeMap<String, ClaimEntry>,
}

impl ClaimLedger {
    /// Opens the ledger at `path`, treating a missing file as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PoliteflowError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                PoliteflowError::Internal(format!(
                    "claim ledger {} is corrupt: {e}",
                    path.display()
                ))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(PoliteflowError::Internal(format!(
                    "cannot read claim ledger {}: {err}",
                    path.display()
                )));
            }
        };
        Ok(Self { path, entries })
    }

    /// True when the reward for this (post, user) pair was already claimed.
    pub fn is_claimed(&self, post_id: PostId, user: &UserId) -> bool {
        self.entries
            .get(&key(post_id, user))
            .is_some_and(|e| e.claimed)
    }

    /// Records a successful claim. Idempotent.
    pub fn mark_claimed(
        &mut self,
        post_id: PostId,
        user: &UserId,
    ) -> Result<(), PoliteflowError> {
        let entry = self.entries.entry(key(post_id, user)).or_default();
        if !entry.claimed {
            entry.claimed = true;
            entry.claimed_at = Some(Utc::now().to_rfc3339());
        }
        self.flush()
    }

    /// Marks the eligibility popup as shown, returning `true` only the first
    /// time for a given (post, user) pair.
    pub fn mark_popup_shown(
        &mut self,
        post_id: PostId,
        user: &UserId,
    ) -> Result<bool, PoliteflowError> {
        let entry = self.entries.entry(key(post_id, user)).or_default();
        if entry.popup_shown {
            return Ok(false);
        }
        entry.popup_shown = true;
        self.flush()?;
        Ok(true)
    }

    fn flush(&self) -> Result<(), PoliteflowError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                PoliteflowError::Internal(format!(
                    "cannot create claim ledger dir {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| PoliteflowError::Internal(format!("claim ledger encode: {e}")))?;
        std::fs::write(&self.path, content).map_err(|e| {
            PoliteflowError::Internal(format!(
                "cannot write claim ledger {}: {e}",
                self.path.display()
            ))
        })?;
        debug!(path = %self.path.display(), "claim ledger flushed");
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn key(post_id: PostId, user: &UserId) -> String {
    format!("{}:{}", post_id.0, user.0)
}
