// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reward eligibility aggregation for the Politeflow experiment.
//!
//! Pure derivation of reward progress from per-section comment counts, plus
//! a small file-backed ledger for the locally persisted claimed flag. Not
//! safety-critical; the server remains the authority on actual payout.

pub mod ledger;
pub mod progress;

pub use ledger::{ClaimEntry, ClaimLedger};
pub use progress::{
    REQUIRED_PER_SECTION, REQUIRED_TOTAL, RewardProgress, RewardStage, SECTION_COUNT,
};
