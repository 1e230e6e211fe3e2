// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Politeflow moderation flow.

use thiserror::Error;

/// The primary error type used across all Politeflow adapter traits and flow
/// operations.
///
/// Every variant is scoped to one submission flow: nothing here is fatal to
/// the process, and the draft text survives every failure.
#[derive(Debug, Error)]
pub enum PoliteflowError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transient service errors (network failure, timeout, 5xx from the
    /// classifier/rewriter/store). Retryable by re-submitting the draft.
    #[error("service error: {message}")]
    Service {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The comment store declined the save (validation, duplicate, ban).
    /// Surfaced to the user; the draft is preserved.
    #[error("persistence rejected: {message}")]
    PersistenceRejected { message: String },

    /// Policy metadata could not be fetched and no cached copy exists.
    /// Submission is refused rather than guessing a policy.
    #[error("policy unavailable: {message}")]
    PolicyUnavailable { message: String },

    /// The draft cannot be submitted as-is (empty after trimming, etc.).
    #[error("invalid draft: {0}")]
    InvalidDraft(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PoliteflowError {
    /// Convenience constructor for a transient service error without a cause.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
            source: None,
        }
    }

    /// True when the error is transient and the same user action may be
    /// retried without side effects.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Service { .. } | Self::PolicyUnavailable { .. })
    }
}
