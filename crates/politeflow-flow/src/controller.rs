// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-composer FSM that manages the lifecycle of a single comment
//! submission.
//!
//! Each flow drives one candidate comment from draft to a terminal outcome
//! under the active policy regime:
//!
//! - `nofilter`: Idle -> Persisting -> terminal (no classifier call)
//! - `block`: Idle -> Classifying -> Persisting | Blocked
//! - `polite_one_edit`: Idle -> Classifying -> AwaitingUserDecision ->
//!   (accept | Retrying -> AwaitingRejectionDecision) -> terminal
//!
//! Every terminal outcome resets the flow to `Idle` and regenerates the
//! correlation id, so the composer may immediately start an independent
//! attempt. The user gets exactly one edit chance; a still-failing edit
//! deterministically falls back to the generated suggestion.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use politeflow_core::error::PoliteflowError;
use politeflow_core::traits::{
    ClassifierAdapter, CommentStoreAdapter, EventSinkAdapter, SuggesterAdapter,
};
use politeflow_core::types::{
    ActionApplied, Attempt, CommentDraft, CommentId, CommentRecord, CorrelationId, DecisionRule,
    FinalChoice, InterventionEvent, NewComment, PolicyConfig, PolicyMode, PostId, SectionOrd,
    UserId, Verdict,
};

use crate::policy::PolicyCache;

/// States in the submission flow FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Waiting for a submission.
    Idle,
    /// First-attempt text is at the classifier.
    Classifying,
    /// A rewrite suggestion is shown; the user must accept or edit.
    AwaitingUserDecision,
    /// Second attempt (edited text) is at the classifier.
    Retrying,
    /// The edit also failed; the suggestion is being registered instead.
    AwaitingRejectionDecision,
    /// Final payload is at the comment store.
    Persisting,
    /// Terminal: a comment was persisted.
    Succeeded,
    /// Terminal: the comment was rejected outright, nothing persisted.
    Blocked,
    /// Terminal: a service failure ended the flow; the draft is preserved.
    Failed,
}

impl FlowState {
    fn is_terminal(self) -> bool {
        matches!(self, FlowState::Succeeded | FlowState::Blocked | FlowState::Failed)
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FlowState::Idle => "idle",
            FlowState::Classifying => "classifying",
            FlowState::AwaitingUserDecision => "awaiting_user_decision",
            FlowState::Retrying => "retrying",
            FlowState::AwaitingRejectionDecision => "awaiting_rejection_decision",
            FlowState::Persisting => "persisting",
            FlowState::Succeeded => "succeeded",
            FlowState::Blocked => "blocked",
            FlowState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Discriminated result of one flow step, rendered by the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    /// A comment was persisted. `forced_fallback` marks the
    /// rejection-disclosure terminal: the user's edit was still over
    /// threshold and the suggestion was registered on their behalf.
    Succeeded {
        record: CommentRecord,
        final_choice: FinalChoice,
        forced_fallback: bool,
    },
    /// The comment was rejected outright; nothing was persisted and no
    /// retry is offered.
    Blocked {
        probability: f64,
        threshold_applied: f64,
    },
    /// A suggestion is available; the flow waits for exactly one of
    /// [`SubmissionFlow::accept_suggestion`] or
    /// [`SubmissionFlow::resubmit_edit`].
    AwaitingDecision {
        original_text: String,
        polite_text: String,
        probability: f64,
        threshold_applied: f64,
    },
}

/// First-attempt context retained while the user decides on a suggestion.
struct PendingDecision {
    first_text: String,
    reply_to: Option<CommentId>,
    verdict: Verdict,
    polite_text: String,
}

/// Drives one comment from draft to terminal outcome.
///
/// One instance is active per open comment composer. The FSM state itself is
/// the re-entrancy guard: a second `submit` while a flow is in progress is
/// refused instead of racing the first.
pub struct SubmissionFlow {
    user_id: UserId,
    post_id: PostId,
    section: SectionOrd,
    classifier: Arc<dyn ClassifierAdapter>,
    suggester: Arc<dyn SuggesterAdapter>,
    store: Arc<dyn CommentStoreAdapter>,
    events: Arc<dyn EventSinkAdapter>,
    policy: PolicyCache,
    state: FlowState,
    correlation_id: CorrelationId,
    started_at: Option<Instant>,
    pending: Option<PendingDecision>,
}

impl SubmissionFlow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        post_id: PostId,
        section: SectionOrd,
        classifier: Arc<dyn ClassifierAdapter>,
        suggester: Arc<dyn SuggesterAdapter>,
        store: Arc<dyn CommentStoreAdapter>,
        events: Arc<dyn EventSinkAdapter>,
        policy: PolicyCache,
    ) -> Self {
        Self {
            user_id,
            post_id,
            section,
            classifier,
            suggester,
            store,
            events,
            policy,
            state: FlowState::Idle,
            correlation_id: CorrelationId::generate(),
            started_at: None,
            pending: None,
        }
    }

    /// Returns the current FSM state.
    ///
    /// Terminal states are transient: by the time a step returns, the flow
    /// has already reset to `Idle` for the next independent attempt.
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Correlation id of the flow currently in progress (or the next one).
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Submits a draft, running the policy-specific protocol to the first
    /// decision point or terminal outcome.
    ///
    /// On any service failure the flow resets to `Idle` and the caller keeps
    /// the draft; re-submitting is always safe.
    pub async fn submit(
        &mut self,
        draft: &CommentDraft,
    ) -> Result<FlowOutcome, PoliteflowError> {
        if self.state != FlowState::Idle {
            return Err(PoliteflowError::Internal(format!(
                "a submission is already in progress (state: {})",
                self.state
            )));
        }

        let text = draft.model_text();
        if text.is_empty() {
            return Err(PoliteflowError::InvalidDraft(
                "comment text is empty".to_string(),
            ));
        }

        self.started_at = Some(Instant::now());
        debug!(
            correlation_id = self.correlation_id.0.as_str(),
            post_id = self.post_id.0,
            section = self.section.0,
            "submission started"
        );

        let policy = match self.policy.current(self.post_id, self.section).await {
            Ok(policy) => policy,
            Err(err) => return Err(self.fail(err)),
        };

        if policy.mode == PolicyMode::NoFilter {
            // Control condition: no moderation, persist verbatim.
            return self.persist_unmoderated(&text, draft.reply_to, policy).await;
        }

        self.state = FlowState::Classifying;
        let verdict = match self
            .classifier
            .classify(self.post_id, &text, policy.threshold)
            .await
        {
            Ok(verdict) => verdict,
            Err(err) => return Err(self.fail(err)),
        };

        if !verdict.over_threshold {
            return self
                .persist_clean(&text, draft.reply_to, verdict, Some(verdict.probability))
                .await;
        }

        match policy.mode {
            PolicyMode::Block => {
                let mut event = self.event(Attempt::First, verdict.threshold_applied);
                event.original_probability = Some(verdict.probability);
                event.action_applied = ActionApplied::Blocked;
                self.emit(event).await;

                info!(
                    probability = verdict.probability,
                    threshold = verdict.threshold_applied,
                    "comment blocked"
                );
                self.finish(FlowState::Blocked);
                Ok(FlowOutcome::Blocked {
                    probability: verdict.probability,
                    threshold_applied: verdict.threshold_applied,
                })
            }
            PolicyMode::PoliteOneEdit => {
                let suggestion = match self
                    .suggester
                    .suggest(self.post_id, self.section, &text)
                    .await
                {
                    Ok(suggestion) => suggestion,
                    Err(err) => return Err(self.fail(err)),
                };
                let Some(polite_text) = suggestion.text().map(str::to_string) else {
                    // Degraded rewrite service: surface a transient failure,
                    // never silently accept or block.
                    return Err(self.fail(PoliteflowError::service(
                        "rewrite suggestion unavailable",
                    )));
                };

                let mut event = self.event(Attempt::First, verdict.threshold_applied);
                event.original_probability = Some(verdict.probability);
                event.decision_rule = DecisionRule::ForcedAcceptOneEdit;
                event.generated_polite_text = Some(polite_text.clone());
                self.emit(event).await;

                self.state = FlowState::AwaitingUserDecision;
                self.pending = Some(PendingDecision {
                    first_text: text.clone(),
                    reply_to: draft.reply_to,
                    verdict,
                    polite_text: polite_text.clone(),
                });
                Ok(FlowOutcome::AwaitingDecision {
                    original_text: text,
                    polite_text,
                    probability: verdict.probability,
                    threshold_applied: verdict.threshold_applied,
                })
            }
            PolicyMode::NoFilter => unreachable!("handled before classification"),
        }
    }

    /// Accepts the shown suggestion as-is and persists it as the final text.
    pub async fn accept_suggestion(&mut self) -> Result<FlowOutcome, PoliteflowError> {
        if self.state != FlowState::AwaitingUserDecision {
            return Err(PoliteflowError::Internal(format!(
                "no suggestion awaiting decision (state: {})",
                self.state
            )));
        }
        let pending = self
            .pending
            .take()
            .ok_or_else(|| PoliteflowError::Internal("missing pending decision".to_string()))?;

        let comment = NewComment {
            user_id: self.user_id.clone(),
            post_id: self.post_id,
            section: self.section,
            original: pending.first_text,
            generated_polite: Some(pending.polite_text.clone()),
            user_edit: None,
            final_text: Some(pending.polite_text.clone()),
            threshold_applied: Some(pending.verdict.threshold_applied),
            reply_to: pending.reply_to,
        };
        let record = match self.persist(comment).await {
            Ok(record) => record,
            Err(err) => return Err(self.fail(err)),
        };

        let mut event = self.event(Attempt::First, pending.verdict.threshold_applied);
        event.original_probability = Some(pending.verdict.probability);
        event.decision_rule = DecisionRule::ForcedAcceptOneEdit;
        event.generated_polite_text = Some(pending.polite_text);
        event.final_choice_hint = FinalChoice::Polite;
        self.emit(event).await;

        self.finish(FlowState::Succeeded);
        Ok(FlowOutcome::Succeeded {
            record,
            final_choice: FinalChoice::Polite,
            forced_fallback: false,
        })
    }

    /// Re-submits the user's edit of the suggestion: the one and only retry.
    ///
    /// An edit that still classifies over threshold is not accepted as
    /// typed; the generated suggestion is persisted instead and the edit is
    /// retained for audit only.
    pub async fn resubmit_edit(
        &mut self,
        edited_text: &str,
    ) -> Result<FlowOutcome, PoliteflowError> {
        if self.state != FlowState::AwaitingUserDecision {
            return Err(PoliteflowError::Internal(format!(
                "no suggestion awaiting decision (state: {})",
                self.state
            )));
        }
        let edited = edited_text.trim().to_string();
        if edited.is_empty() {
            // Guard failure: the pending decision stays live.
            return Err(PoliteflowError::InvalidDraft(
                "edited text is empty".to_string(),
            ));
        }
        let pending = self
            .pending
            .take()
            .ok_or_else(|| PoliteflowError::Internal("missing pending decision".to_string()))?;

        self.state = FlowState::Retrying;
        let edit_verdict = match self
            .classifier
            .classify(self.post_id, &edited, pending.verdict.threshold_applied)
            .await
        {
            Ok(verdict) => verdict,
            Err(err) => return Err(self.fail(err)),
        };

        if !edit_verdict.over_threshold {
            let comment = NewComment {
                user_id: self.user_id.clone(),
                post_id: self.post_id,
                section: self.section,
                original: pending.first_text,
                generated_polite: Some(pending.polite_text.clone()),
                user_edit: Some(edited.clone()),
                final_text: Some(edited.clone()),
                threshold_applied: Some(edit_verdict.threshold_applied),
                reply_to: pending.reply_to,
            };
            let record = match self.persist(comment).await {
                Ok(record) => record,
                Err(err) => return Err(self.fail(err)),
            };

            let mut event = self.event(Attempt::Second, edit_verdict.threshold_applied);
            event.original_probability = Some(pending.verdict.probability);
            event.decision_rule = DecisionRule::ForcedAcceptOneEdit;
            event.generated_polite_text = Some(pending.polite_text);
            event.user_edit_text = Some(edited);
            event.edit_probability = Some(edit_verdict.probability);
            event.final_choice_hint = FinalChoice::UserEdit;
            self.emit(event).await;

            self.finish(FlowState::Succeeded);
            return Ok(FlowOutcome::Succeeded {
                record,
                final_choice: FinalChoice::UserEdit,
                forced_fallback: false,
            });
        }

        // The single edit chance is spent. Register the suggestion instead
        // and tell the user why, rather than looping or dropping the input.
        self.state = FlowState::AwaitingRejectionDecision;
        info!(
            edit_probability = edit_verdict.probability,
            threshold = edit_verdict.threshold_applied,
            "edit still over threshold, registering suggestion"
        );

        let comment = NewComment {
            user_id: self.user_id.clone(),
            post_id: self.post_id,
            section: self.section,
            original: pending.first_text,
            generated_polite: Some(pending.polite_text.clone()),
            user_edit: Some(edited.clone()),
            final_text: Some(pending.polite_text.clone()),
            threshold_applied: Some(edit_verdict.threshold_applied),
            reply_to: pending.reply_to,
        };
        let record = match self.persist(comment).await {
            Ok(record) => record,
            Err(err) => return Err(self.fail(err)),
        };

        let mut event = self.event(Attempt::Second, edit_verdict.threshold_applied);
        event.original_probability = Some(pending.verdict.probability);
        event.decision_rule = DecisionRule::ForcedAcceptOneEdit;
        event.generated_polite_text = Some(pending.polite_text);
        event.user_edit_text = Some(edited);
        event.edit_probability = Some(edit_verdict.probability);
        event.final_choice_hint = FinalChoice::Polite;
        self.emit(event).await;

        self.finish(FlowState::Succeeded);
        Ok(FlowOutcome::Succeeded {
            record,
            final_choice: FinalChoice::Polite,
            forced_fallback: true,
        })
    }

    /// Persist path for the `nofilter` control condition.
    async fn persist_unmoderated(
        &mut self,
        text: &str,
        reply_to: Option<CommentId>,
        policy: PolicyConfig,
    ) -> Result<FlowOutcome, PoliteflowError> {
        let comment = NewComment {
            user_id: self.user_id.clone(),
            post_id: self.post_id,
            section: self.section,
            original: text.to_string(),
            generated_polite: None,
            user_edit: None,
            final_text: None,
            threshold_applied: None,
            reply_to,
        };
        let record = match self.persist(comment).await {
            Ok(record) => record,
            Err(err) => return Err(self.fail(err)),
        };

        let event = self.event_with_hint(Attempt::First, policy.threshold, FinalChoice::Original);
        self.emit(event).await;

        self.finish(FlowState::Succeeded);
        Ok(FlowOutcome::Succeeded {
            record,
            final_choice: FinalChoice::Original,
            forced_fallback: false,
        })
    }

    /// Persist path for an under-threshold first attempt.
    async fn persist_clean(
        &mut self,
        text: &str,
        reply_to: Option<CommentId>,
        verdict: Verdict,
        probability: Option<f64>,
    ) -> Result<FlowOutcome, PoliteflowError> {
        let comment = NewComment {
            user_id: self.user_id.clone(),
            post_id: self.post_id,
            section: self.section,
            original: text.to_string(),
            generated_polite: None,
            user_edit: None,
            final_text: None,
            threshold_applied: Some(verdict.threshold_applied),
            reply_to,
        };
        let record = match self.persist(comment).await {
            Ok(record) => record,
            Err(err) => return Err(self.fail(err)),
        };

        let mut event =
            self.event_with_hint(Attempt::First, verdict.threshold_applied, FinalChoice::Original);
        event.original_probability = probability;
        self.emit(event).await;

        self.finish(FlowState::Succeeded);
        Ok(FlowOutcome::Succeeded {
            record,
            final_choice: FinalChoice::Original,
            forced_fallback: false,
        })
    }

    async fn persist(&mut self, comment: NewComment) -> Result<CommentRecord, PoliteflowError> {
        self.state = FlowState::Persisting;
        let receipt = self.store.persist(&comment).await?;
        if !receipt.saved {
            return Err(PoliteflowError::PersistenceRejected {
                message: "comment store reported saved=false".to_string(),
            });
        }
        debug!(comment_id = receipt.comment.id.0, "comment persisted");
        Ok(receipt.comment)
    }

    /// Base event carrying the flow header fields; call sites fill in the
    /// decision-specific ones.
    fn event(&self, attempt: Attempt, threshold_applied: f64) -> InterventionEvent {
        InterventionEvent {
            user_id: self.user_id.clone(),
            post_id: self.post_id,
            section: self.section,
            correlation_id: self.correlation_id.clone(),
            attempt_no: attempt.number(),
            original_probability: None,
            threshold_applied,
            action_applied: ActionApplied::None,
            decision_rule: DecisionRule::None,
            generated_polite_text: None,
            user_edit_text: None,
            edit_probability: None,
            final_choice_hint: FinalChoice::Unknown,
            latency_ms: self
                .started_at
                .map(|t| t.elapsed().as_millis() as u64)
                .unwrap_or(0),
        }
    }

    fn event_with_hint(
        &self,
        attempt: Attempt,
        threshold_applied: f64,
        hint: FinalChoice,
    ) -> InterventionEvent {
        let mut event = self.event(attempt, threshold_applied);
        event.final_choice_hint = hint;
        event
    }

    /// Fire-and-forget event emission: sink failures are warned and swallowed.
    async fn emit(&self, event: InterventionEvent) {
        if let Err(err) = self.events.log_event(&event).await {
            warn!(
                correlation_id = event.correlation_id.0.as_str(),
                error = %err,
                "failed to log intervention event (non-fatal)"
            );
        }
    }

    /// Marks a terminal state, then resets for the next independent attempt.
    fn finish(&mut self, terminal: FlowState) {
        debug_assert!(terminal.is_terminal());
        debug!(
            correlation_id = self.correlation_id.0.as_str(),
            outcome = %terminal,
            "flow finished"
        );
        self.state = FlowState::Idle;
        self.pending = None;
        self.started_at = None;
        self.correlation_id = CorrelationId::generate();
    }

    /// Terminal failure: reset the flow and hand the error back. The caller
    /// keeps the draft; nothing has been silently dropped.
    fn fail(&mut self, err: PoliteflowError) -> PoliteflowError {
        warn!(error = %err, "submission flow failed");
        self.finish(FlowState::Failed);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use politeflow_core::traits::PolicyAdapter;
    use politeflow_core::types::{PersistReceipt, ReactionKind, Suggestion};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

    /// Classifier fake returning scripted probabilities per exact text.
    struct FakeClassifier {
        scores: HashMap<String, f64>,
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl FakeClassifier {
        fn scripted(pairs: &[(&str, f64)]) -> Arc<Self> {
            Arc::new(Self {
                scores: pairs.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl ClassifierAdapter for FakeClassifier {
        async fn classify(
            &self,
            _post_id: PostId,
            text: &str,
            threshold: f64,
        ) -> Result<Verdict, PoliteflowError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(PoliteflowError::service("classifier down"));
            }
            let probability = *self
                .scores
                .get(text)
                .unwrap_or_else(|| panic!("unscripted text: {text:?}"));
            Ok(Verdict::from_probability(probability, threshold))
        }
    }

    struct FakeSuggester {
        polite_text: Option<String>,
        fail: bool,
    }

    #[async_trait]
    impl SuggesterAdapter for FakeSuggester {
        async fn suggest(
            &self,
            _post_id: PostId,
            _section: SectionOrd,
            _text: &str,
        ) -> Result<Suggestion, PoliteflowError> {
            if self.fail {
                return Err(PoliteflowError::service("rewriter down"));
            }
            Ok(Suggestion {
                polite_text: self.polite_text.clone(),
            })
        }
    }

    struct FakeStore {
        saved: Mutex<Vec<NewComment>>,
        next_id: AtomicI64,
        fail_next: AtomicBool,
    }

    impl FakeStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                saved: Mutex::new(Vec::new()),
                next_id: AtomicI64::new(1),
                fail_next: AtomicBool::new(false),
            })
        }

        fn saved(&self) -> Vec<NewComment> {
            self.saved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommentStoreAdapter for FakeStore {
        async fn persist(
            &self,
            comment: &NewComment,
        ) -> Result<PersistReceipt, PoliteflowError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(PoliteflowError::service("store down"));
            }
            self.saved.lock().unwrap().push(comment.clone());
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(PersistReceipt {
                saved: true,
                comment: CommentRecord {
                    id: CommentId(id),
                    user_id: comment.user_id.clone(),
                    post_id: comment.post_id,
                    section: comment.section,
                    original: comment.original.clone(),
                    generated_polite: comment.generated_polite.clone(),
                    user_edit: comment.user_edit.clone(),
                    final_text: comment.final_text.clone(),
                    reply_to: comment.reply_to,
                    created_at: "2026-03-01T10:00:00Z".into(),
                    likes: 0,
                    dislikes: 0,
                },
            })
        }

        async fn list(
            &self,
            _post_id: PostId,
            _section: SectionOrd,
            _viewer: &UserId,
        ) -> Result<Vec<CommentRecord>, PoliteflowError> {
            Ok(Vec::new())
        }

        async fn toggle_reaction(
            &self,
            _comment_id: CommentId,
            _viewer: &UserId,
            _kind: ReactionKind,
        ) -> Result<(), PoliteflowError> {
            Ok(())
        }
    }

    struct FakeSink {
        events: Mutex<Vec<InterventionEvent>>,
        fail: bool,
    }

    impl FakeSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
                fail: false,
            })
        }

        fn events(&self) -> Vec<InterventionEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventSinkAdapter for FakeSink {
        async fn log_event(&self, event: &InterventionEvent) -> Result<(), PoliteflowError> {
            if self.fail {
                return Err(PoliteflowError::service("log endpoint down"));
            }
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FixedPolicy(PolicyConfig);

    #[async_trait]
    impl PolicyAdapter for FixedPolicy {
        async fn fetch_policy(
            &self,
            _post_id: PostId,
            _section: SectionOrd,
        ) -> Result<PolicyConfig, PoliteflowError> {
            Ok(self.0)
        }
    }

    struct Harness {
        flow: SubmissionFlow,
        classifier: Arc<FakeClassifier>,
        store: Arc<FakeStore>,
        sink: Arc<FakeSink>,
    }

    fn harness(
        mode: PolicyMode,
        threshold: f64,
        classifier: Arc<FakeClassifier>,
        suggester: FakeSuggester,
    ) -> Harness {
        let store = FakeStore::new();
        let sink = FakeSink::new();
        let policy = PolicyCache::new(Arc::new(FixedPolicy(PolicyConfig { mode, threshold })));
        let flow = SubmissionFlow::new(
            UserId("u_test".into()),
            PostId(1),
            SectionOrd(2),
            classifier.clone(),
            Arc::new(suggester),
            store.clone(),
            sink.clone(),
            policy,
        );
        Harness {
            flow,
            classifier,
            store,
            sink,
        }
    }

    fn no_suggester() -> FakeSuggester {
        FakeSuggester {
            polite_text: None,
            fail: false,
        }
    }

    fn suggester(text: &str) -> FakeSuggester {
        FakeSuggester {
            polite_text: Some(text.to_string()),
            fail: false,
        }
    }

    #[tokio::test]
    async fn nofilter_persists_verbatim_without_classification() {
        let classifier = FakeClassifier::scripted(&[]);
        let mut h = harness(PolicyMode::NoFilter, 0.5, classifier, no_suggester());

        let outcome = h.flow.submit(&CommentDraft::new("any text at all")).await.unwrap();
        let FlowOutcome::Succeeded { record, final_choice, forced_fallback } = outcome else {
            panic!("expected success");
        };
        assert_eq!(record.original, "any text at all");
        assert_eq!(final_choice, FinalChoice::Original);
        assert!(!forced_fallback);
        assert_eq!(h.classifier.calls.load(Ordering::SeqCst), 0);

        let events = h.sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].original_probability, None);
        assert_eq!(events[0].final_choice_hint, FinalChoice::Original);
    }

    #[tokio::test]
    async fn block_under_threshold_succeeds_with_original() {
        let classifier = FakeClassifier::scripted(&[("hello", 0.1)]);
        let mut h = harness(PolicyMode::Block, 0.5, classifier, no_suggester());

        let outcome = h.flow.submit(&CommentDraft::new("hello")).await.unwrap();
        let FlowOutcome::Succeeded { record, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(record.display_text(), "hello");
        assert_eq!(h.store.saved().len(), 1);

        let events = h.sink.events();
        assert_eq!(events[0].action_applied, ActionApplied::None);
        assert_eq!(events[0].decision_rule, DecisionRule::None);
        assert_eq!(events[0].original_probability, Some(0.1));
    }

    #[tokio::test]
    async fn block_over_threshold_blocks_without_persisting() {
        let classifier = FakeClassifier::scripted(&[("you are an idiot", 0.9)]);
        let mut h = harness(PolicyMode::Block, 0.5, classifier, no_suggester());

        let outcome = h.flow.submit(&CommentDraft::new("you are an idiot")).await.unwrap();
        assert!(matches!(outcome, FlowOutcome::Blocked { probability, .. } if probability == 0.9));
        assert!(h.store.saved().is_empty());

        let events = h.sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action_applied, ActionApplied::Blocked);
        assert_eq!(events[0].final_choice_hint, FinalChoice::Unknown);
        assert_eq!(h.flow.state(), FlowState::Idle);
    }

    #[tokio::test]
    async fn polite_accept_as_is_persists_suggestion() {
        let classifier = FakeClassifier::scripted(&[("you are an idiot", 0.9)]);
        let mut h = harness(
            PolicyMode::PoliteOneEdit,
            0.5,
            classifier,
            suggester("please be respectful"),
        );

        let outcome = h.flow.submit(&CommentDraft::new("you are an idiot")).await.unwrap();
        let FlowOutcome::AwaitingDecision { polite_text, .. } = outcome else {
            panic!("expected awaiting decision");
        };
        assert_eq!(polite_text, "please be respectful");
        assert_eq!(h.flow.state(), FlowState::AwaitingUserDecision);

        let outcome = h.flow.accept_suggestion().await.unwrap();
        let FlowOutcome::Succeeded { record, final_choice, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(final_choice, FinalChoice::Polite);
        assert_eq!(record.final_text.as_deref(), Some("please be respectful"));
        assert_eq!(record.original, "you are an idiot");

        let events = h.sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].final_choice_hint, FinalChoice::Unknown);
        assert_eq!(events[1].final_choice_hint, FinalChoice::Polite);
        // Both events belong to the same flow.
        assert_eq!(events[0].correlation_id, events[1].correlation_id);
    }

    #[tokio::test]
    async fn polite_clean_edit_persists_user_edit_with_audit_trail() {
        let classifier = FakeClassifier::scripted(&[
            ("you are an idiot", 0.9),
            ("I think you are mistaken", 0.2),
        ]);
        let mut h = harness(
            PolicyMode::PoliteOneEdit,
            0.5,
            classifier,
            suggester("please be respectful"),
        );

        h.flow.submit(&CommentDraft::new("you are an idiot")).await.unwrap();
        let outcome = h.flow.resubmit_edit("I think you are mistaken").await.unwrap();
        let FlowOutcome::Succeeded { record, final_choice, forced_fallback } = outcome else {
            panic!("expected success");
        };
        assert_eq!(final_choice, FinalChoice::UserEdit);
        assert!(!forced_fallback);
        assert_eq!(record.final_text.as_deref(), Some("I think you are mistaken"));
        // Both provenance variants are retained for audit.
        assert_eq!(record.generated_polite.as_deref(), Some("please be respectful"));
        assert_eq!(record.user_edit.as_deref(), Some("I think you are mistaken"));

        let events = h.sink.events();
        assert_eq!(events[1].attempt_no, 2);
        assert_eq!(events[1].edit_probability, Some(0.2));
        assert_eq!(events[1].final_choice_hint, FinalChoice::UserEdit);
    }

    #[tokio::test]
    async fn polite_failing_edit_forces_suggestion_fallback() {
        let classifier = FakeClassifier::scripted(&[
            ("you are an idiot", 0.9),
            ("you're still dumb", 0.8),
        ]);
        let mut h = harness(
            PolicyMode::PoliteOneEdit,
            0.5,
            classifier,
            suggester("please be respectful"),
        );

        h.flow.submit(&CommentDraft::new("you are an idiot")).await.unwrap();
        let outcome = h.flow.resubmit_edit("you're still dumb").await.unwrap();
        let FlowOutcome::Succeeded { record, final_choice, forced_fallback } = outcome else {
            panic!("expected success");
        };
        // The rejected edit is never the final text.
        assert_eq!(final_choice, FinalChoice::Polite);
        assert!(forced_fallback);
        assert_eq!(record.final_text.as_deref(), Some("please be respectful"));
        assert_eq!(record.user_edit.as_deref(), Some("you're still dumb"));

        let events = h.sink.events();
        assert_eq!(events[1].attempt_no, 2);
        assert_eq!(events[1].user_edit_text.as_deref(), Some("you're still dumb"));
        assert_eq!(events[1].edit_probability, Some(0.8));
        assert_eq!(events[1].final_choice_hint, FinalChoice::Polite);
    }

    #[tokio::test]
    async fn only_one_edit_chance_is_ever_offered() {
        let classifier = FakeClassifier::scripted(&[
            ("you are an idiot", 0.9),
            ("you're still dumb", 0.8),
        ]);
        let mut h = harness(
            PolicyMode::PoliteOneEdit,
            0.5,
            classifier,
            suggester("please be respectful"),
        );

        h.flow.submit(&CommentDraft::new("you are an idiot")).await.unwrap();
        h.flow.resubmit_edit("you're still dumb").await.unwrap();

        // The flow is terminal; a third try is refused, not re-moderated.
        let err = h.flow.resubmit_edit("another failing edit").await.unwrap_err();
        assert!(matches!(err, PoliteflowError::Internal(_)));
        assert_eq!(h.store.saved().len(), 1);
    }

    #[tokio::test]
    async fn mention_prefix_is_stripped_before_services() {
        let classifier = FakeClassifier::scripted(&[("thanks for this", 0.1)]);
        let mut h = harness(PolicyMode::Block, 0.5, classifier, no_suggester());

        let draft = CommentDraft::reply("@alice thanks for this", CommentId(42));
        let outcome = h.flow.submit(&draft).await.unwrap();
        let FlowOutcome::Succeeded { record, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(record.original, "thanks for this");
        assert_eq!(record.reply_to, Some(CommentId(42)));
    }

    #[tokio::test]
    async fn empty_draft_is_rejected_without_starting() {
        let classifier = FakeClassifier::scripted(&[]);
        let mut h = harness(PolicyMode::Block, 0.5, classifier, no_suggester());

        let before = h.flow.correlation_id().clone();
        let err = h.flow.submit(&CommentDraft::new("   ")).await.unwrap_err();
        assert!(matches!(err, PoliteflowError::InvalidDraft(_)));
        assert_eq!(h.flow.state(), FlowState::Idle);
        // No flow started, so no new correlation id either.
        assert_eq!(h.flow.correlation_id(), &before);
    }

    #[tokio::test]
    async fn correlation_id_regenerates_after_each_terminal_outcome() {
        let classifier = FakeClassifier::scripted(&[("hello", 0.1), ("world", 0.1)]);
        let mut h = harness(PolicyMode::Block, 0.5, classifier, no_suggester());

        h.flow.submit(&CommentDraft::new("hello")).await.unwrap();
        h.flow.submit(&CommentDraft::new("world")).await.unwrap();

        let events = h.sink.events();
        assert_eq!(events.len(), 2);
        assert_ne!(events[0].correlation_id, events[1].correlation_id);
    }

    #[tokio::test]
    async fn classifier_failure_resets_to_idle() {
        let classifier = FakeClassifier::scripted(&[("hello", 0.1)]);
        classifier.fail.store(true, Ordering::SeqCst);
        let mut h = harness(PolicyMode::Block, 0.5, classifier, no_suggester());

        let err = h.flow.submit(&CommentDraft::new("hello")).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(h.flow.state(), FlowState::Idle);
        assert!(h.store.saved().is_empty());

        // Retry after the outage: classification is idempotent and cheap.
        h.classifier.fail.store(false, Ordering::SeqCst);
        let outcome = h.flow.submit(&CommentDraft::new("hello")).await.unwrap();
        assert!(matches!(outcome, FlowOutcome::Succeeded { .. }));
    }

    #[tokio::test]
    async fn persistence_failure_is_retryable_by_resubmitting() {
        let classifier = FakeClassifier::scripted(&[("hello", 0.1)]);
        let mut h = harness(PolicyMode::Block, 0.5, classifier, no_suggester());
        h.store.fail_next.store(true, Ordering::SeqCst);

        let err = h.flow.submit(&CommentDraft::new("hello")).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(h.flow.state(), FlowState::Idle);

        let outcome = h.flow.submit(&CommentDraft::new("hello")).await.unwrap();
        assert!(matches!(outcome, FlowOutcome::Succeeded { .. }));
        // A fresh classify call per attempt, no other side effects.
        assert_eq!(h.classifier.calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.store.saved().len(), 1);
    }

    #[tokio::test]
    async fn missing_suggestion_fails_with_draft_preserved() {
        let classifier = FakeClassifier::scripted(&[("you are an idiot", 0.9)]);
        let mut h = harness(PolicyMode::PoliteOneEdit, 0.5, classifier, no_suggester());

        let err = h.flow.submit(&CommentDraft::new("you are an idiot")).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(h.flow.state(), FlowState::Idle);
        assert!(h.store.saved().is_empty());
    }

    #[tokio::test]
    async fn sink_failure_never_blocks_the_flow() {
        let classifier = FakeClassifier::scripted(&[("hello", 0.1)]);
        let store = FakeStore::new();
        let sink = Arc::new(FakeSink {
            events: Mutex::new(Vec::new()),
            fail: true,
        });
        let policy = PolicyCache::new(Arc::new(FixedPolicy(PolicyConfig {
            mode: PolicyMode::Block,
            threshold: 0.5,
        })));
        let mut flow = SubmissionFlow::new(
            UserId("u_test".into()),
            PostId(1),
            SectionOrd(1),
            classifier,
            Arc::new(no_suggester()),
            store.clone(),
            sink,
            policy,
        );

        let outcome = flow.submit(&CommentDraft::new("hello")).await.unwrap();
        assert!(matches!(outcome, FlowOutcome::Succeeded { .. }));
        assert_eq!(store.saved().len(), 1);
    }

    #[tokio::test]
    async fn submit_is_refused_while_awaiting_decision() {
        let classifier = FakeClassifier::scripted(&[("you are an idiot", 0.9)]);
        let mut h = harness(
            PolicyMode::PoliteOneEdit,
            0.5,
            classifier,
            suggester("please be respectful"),
        );

        h.flow.submit(&CommentDraft::new("you are an idiot")).await.unwrap();
        let err = h.flow.submit(&CommentDraft::new("something else")).await.unwrap_err();
        assert!(matches!(err, PoliteflowError::Internal(_)));
        // The pending decision is untouched and can still be resolved.
        let outcome = h.flow.accept_suggestion().await.unwrap();
        assert!(matches!(outcome, FlowOutcome::Succeeded { .. }));
    }

    #[tokio::test]
    async fn empty_edit_keeps_the_decision_pending() {
        let classifier = FakeClassifier::scripted(&[("you are an idiot", 0.9)]);
        let mut h = harness(
            PolicyMode::PoliteOneEdit,
            0.5,
            classifier,
            suggester("please be respectful"),
        );

        h.flow.submit(&CommentDraft::new("you are an idiot")).await.unwrap();
        let err = h.flow.resubmit_edit("   ").await.unwrap_err();
        assert!(matches!(err, PoliteflowError::InvalidDraft(_)));
        assert_eq!(h.flow.state(), FlowState::AwaitingUserDecision);

        let outcome = h.flow.accept_suggestion().await.unwrap();
        assert!(matches!(outcome, FlowOutcome::Succeeded { .. }));
    }

    #[test]
    fn flow_state_display() {
        assert_eq!(FlowState::Idle.to_string(), "idle");
        assert_eq!(FlowState::AwaitingUserDecision.to_string(), "awaiting_user_decision");
        assert_eq!(
            FlowState::AwaitingRejectionDecision.to_string(),
            "awaiting_rejection_decision"
        );
        assert_eq!(FlowState::Blocked.to_string(), "blocked");
    }
}
