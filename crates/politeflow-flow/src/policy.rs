// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cached policy acquisition.
//!
//! The server-provided policy is authoritative. The cache only answers when
//! a fresh fetch fails, in which case the last-known-good value is used; a
//! configured fallback covers the very first fetch. With neither available
//! the submission is refused rather than guessing a policy.

use std::sync::Arc;

use tracing::{debug, warn};

use politeflow_core::error::PoliteflowError;
use politeflow_core::traits::PolicyAdapter;
use politeflow_core::types::{PolicyConfig, PostId, SectionOrd};

/// Policy source with last-known-good fallback semantics.
pub struct PolicyCache {
    adapter: Arc<dyn PolicyAdapter>,
    cached: Option<PolicyConfig>,
    fallback: Option<PolicyConfig>,
}

impl PolicyCache {
    pub fn new(adapter: Arc<dyn PolicyAdapter>) -> Self {
        Self {
            adapter,
            cached: None,
            fallback: None,
        }
    }

    /// Sets a configured fallback policy, used only before the first
    /// successful fetch.
    pub fn with_fallback(mut self, fallback: Option<PolicyConfig>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Returns the last successfully fetched policy, if any.
    pub fn last_known_good(&self) -> Option<PolicyConfig> {
        self.cached
    }

    /// Fetches the current policy, falling back to the cache on failure.
    pub async fn current(
        &mut self,
        post_id: PostId,
        section: SectionOrd,
    ) -> Result<PolicyConfig, PoliteflowError> {
        match self.adapter.fetch_policy(post_id, section).await {
            Ok(policy) => {
                debug!(mode = %policy.mode, threshold = policy.threshold, "policy refreshed");
                self.cached = Some(policy);
                Ok(policy)
            }
            Err(err) => {
                if let Some(policy) = self.cached {
                    warn!(error = %err, "policy fetch failed, using last-known-good");
                    return Ok(policy);
                }
                if let Some(policy) = self.fallback {
                    warn!(error = %err, "policy fetch failed, using configured fallback");
                    return Ok(policy);
                }
                Err(PoliteflowError::PolicyUnavailable {
                    message: format!("policy fetch failed and no cached policy exists: {err}"),
                })
            }
        }
    }
}
