// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suggester adapter trait for the text-rewriting service.

use async_trait::async_trait;

use crate::error::PoliteflowError;
use crate::types::{PostId, SectionOrd, Suggestion};

/// Adapter for the remote rewrite-suggestion service.
#[async_trait]
pub trait SuggesterAdapter: Send + Sync {
    /// Requests a polite rewrite of `text`.
    ///
    /// A suggestion with no text means generation failed upstream; callers
    /// must treat that as "no suggestion available", not as an error.
    async fn suggest(
        &self,
        post_id: PostId,
        section: SectionOrd,
        text: &str,
    ) -> Result<Suggestion, PoliteflowError>;
}
