// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Politeflow moderated-comment experiment platform.
//!
//! This crate provides the foundational adapter traits, error types, and
//! domain types used throughout the Politeflow workspace. The flow
//! controller in `politeflow-flow` drives the adapters defined here; HTTP
//! implementations live in `politeflow-client`.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PoliteflowError;
pub use types::{
    ActionApplied, Attempt, CommentDraft, CommentId, CommentRecord, CorrelationId, DecisionRule,
    FinalChoice, InterventionEvent, NewComment, PersistReceipt, PolicyConfig, PolicyMode, PostId,
    ReactionKind, RewardStatus, SectionOrd, Suggestion, UserId, Verdict,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    ClassifierAdapter, CommentStoreAdapter, EventSinkAdapter, PolicyAdapter, SuggesterAdapter,
};
