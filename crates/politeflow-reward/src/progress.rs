// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reward eligibility derivation.
//!
//! Pure aggregation over per-section comment counts: each section
//! contributes at most [`REQUIRED_PER_SECTION`] comments, the total fill is
//! capped at [`REQUIRED_TOTAL`], and eligibility requires every section to
//! meet its quota and the capped total to be full.

use std::collections::BTreeMap;

use politeflow_core::types::RewardStatus;

/// Comments required per section before extra comments stop counting.
pub const REQUIRED_PER_SECTION: u32 = 3;
/// Capped total required for eligibility.
pub const REQUIRED_TOTAL: u32 = 9;
/// Number of article sections in the experiment.
pub const SECTION_COUNT: u8 = 3;

/// Reward progress stage for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardStage {
    NotEligible,
    Eligible,
    Claimed,
}

/// Derived reward progress for one (post, user) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardProgress {
    /// Per-section contribution, capped at [`REQUIRED_PER_SECTION`].
    pub capped: BTreeMap<u8, u32>,
    /// Comments beyond the per-section cap (displayed, never counted).
    pub overflow: BTreeMap<u8, u32>,
    /// Sum of capped contributions, at most [`REQUIRED_TOTAL`].
    pub filled: u32,
    pub per_section_met: bool,
    pub total_met: bool,
    pub eligible: bool,
}

impl RewardProgress {
    /// Derives progress from raw per-section counts. Missing sections count
    /// as zero; unknown section ordinals are ignored.
    pub fn from_counts(counts: &BTreeMap<u8, u32>) -> Self {
        let mut capped = BTreeMap::new();
        let mut overflow = BTreeMap::new();

        for section in 1..=SECTION_COUNT {
            let count = counts.get(&section).copied().unwrap_or(0);
            capped.insert(section, count.min(REQUIRED_PER_SECTION));
            overflow.insert(section, count.saturating_sub(REQUIRED_PER_SECTION));
        }

        let filled = capped.values().sum::<u32>().min(REQUIRED_TOTAL);
        let per_section_met = capped.values().all(|&c| c >= REQUIRED_PER_SECTION);
        let total_met = filled >= REQUIRED_TOTAL;

        Self {
            capped,
            overflow,
            filled,
            per_section_met,
            total_met,
            eligible: per_section_met && total_met,
        }
    }

    /// Derives progress from a server-reported reward status.
    pub fn from_status(status: &RewardStatus) -> Self {
        Self::from_counts(&status.per_section_counts)
    }

    /// Fill ratio in [0, 1] for progress bars.
    pub fn ratio(&self) -> f64 {
        f64::from(self.filled) / f64::from(REQUIRED_TOTAL)
    }

    /// Resolves the presentation stage. The server's eligibility verdict is
    /// honored even when the local derivation lags behind it.
    pub fn stage(&self, server_eligible: bool, already_claimed: bool) -> RewardStage {
        if already_claimed {
            RewardStage::Claimed
        } else if self.eligible || server_eligible {
            RewardStage::Eligible
        } else {
            RewardStage::NotEligible
        }
    }
}
