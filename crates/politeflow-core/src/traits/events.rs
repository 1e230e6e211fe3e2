// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event sink adapter trait for intervention analytics.

use async_trait::async_trait;

use crate::error::PoliteflowError;
use crate::types::InterventionEvent;

/// Adapter for the append-only intervention event log.
///
/// Emission is best-effort: the flow controller swallows sink errors and
/// surfaces them only on a warning channel. Consumers of the log may assume
/// per-flow ordering but must not assume delivery.
#[async_trait]
pub trait EventSinkAdapter: Send + Sync {
    /// Appends one intervention event.
    async fn log_event(&self, event: &InterventionEvent) -> Result<(), PoliteflowError>;
}
