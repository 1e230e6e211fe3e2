// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Comment store adapter trait for the persistence backend.

use async_trait::async_trait;

use crate::error::PoliteflowError;
use crate::types::{
    CommentId, CommentRecord, NewComment, PersistReceipt, PostId, ReactionKind, SectionOrd,
    UserId,
};

/// Adapter for durable comment persistence and retrieval.
#[async_trait]
pub trait CommentStoreAdapter: Send + Sync {
    /// Persists a comment with full provenance and returns the durable record.
    ///
    /// A declined save (validation failure, banned user) surfaces as
    /// [`PoliteflowError::PersistenceRejected`]; transport failures as
    /// [`PoliteflowError::Service`].
    async fn persist(&self, comment: &NewComment) -> Result<PersistReceipt, PoliteflowError>;

    /// Lists the comments of one (post, section) pair, flat, oldest first.
    async fn list(
        &self,
        post_id: PostId,
        section: SectionOrd,
        viewer: &UserId,
    ) -> Result<Vec<CommentRecord>, PoliteflowError>;

    /// Toggles a viewer's reaction on a comment.
    async fn toggle_reaction(
        &self,
        comment_id: CommentId,
        viewer: &UserId,
        kind: ReactionKind,
    ) -> Result<(), PoliteflowError>;
}
