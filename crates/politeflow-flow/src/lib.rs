// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Submission flow controller for the Politeflow experiment platform.
//!
//! This crate holds the one piece of the system with real branching logic:
//! the per-composer state machine that takes a comment draft through
//! classification, optional rewriting, an optional single forced-edit retry,
//! and final persistence, emitting an intervention event at every decision
//! point. Service access goes through the adapter traits in
//! `politeflow-core`; the HTTP implementations live in `politeflow-client`.

pub mod controller;
pub mod policy;

pub use controller::{FlowOutcome, FlowState, SubmissionFlow};
pub use policy::PolicyCache;
