// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the services the flow controller drives.
//!
//! All adapters are pure request/response seams with no business logic and
//! use `#[async_trait]` for dynamic dispatch compatibility.

pub mod classifier;
pub mod events;
pub mod policy;
pub mod store;
pub mod suggester;

// Re-export all traits at the traits module level for convenience.
pub use classifier::ClassifierAdapter;
pub use events::EventSinkAdapter;
pub use policy::PolicyAdapter;
pub use store::CommentStoreAdapter;
pub use suggester::SuggesterAdapter;
