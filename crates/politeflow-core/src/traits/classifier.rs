// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifier adapter trait for the toxicity-classification service.

use async_trait::async_trait;

use crate::error::PoliteflowError;
use crate::types::{PostId, Verdict};

/// Adapter for the remote toxicity classifier.
///
/// Classification is cheap and idempotent: a failed later step may re-incur
/// a classify call with no special-casing.
#[async_trait]
pub trait ClassifierAdapter: Send + Sync {
    /// Classifies `text` against `threshold` and returns an immutable verdict.
    ///
    /// The service may recompute the threshold; the verdict carries the
    /// threshold actually applied.
    async fn classify(
        &self,
        post_id: PostId,
        text: &str,
        threshold: f64,
    ) -> Result<Verdict, PoliteflowError>;
}
