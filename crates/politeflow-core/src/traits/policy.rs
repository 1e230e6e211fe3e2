// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Policy adapter trait for experiment metadata.

use async_trait::async_trait;

use crate::error::PoliteflowError;
use crate::types::{PolicyConfig, PostId, SectionOrd};

/// Adapter for fetching the moderation policy of a (post, section) pair.
///
/// The server value is authoritative. Callers may cache the last-known-good
/// configuration as a fallback for fetch failures, but a fresh fetch always
/// wins over the cache.
#[async_trait]
pub trait PolicyAdapter: Send + Sync {
    /// Fetches the current policy configuration.
    async fn fetch_policy(
        &self,
        post_id: PostId,
        section: SectionOrd,
    ) -> Result<PolicyConfig, PoliteflowError>;
}
