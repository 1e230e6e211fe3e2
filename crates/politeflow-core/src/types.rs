// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across adapter traits and the flow controller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque, locally generated identifier for an experiment participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier of an article post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostId(pub i64);

/// Ordinal of an article section (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionOrd(pub u8);

/// Identifier of a persisted comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub i64);

/// Opaque identifier grouping all intervention events belonging to one
/// submission flow instance. Regenerated after every terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    /// Generates a fresh random correlation id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Experimental moderation policy regime for a (post, section) pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    /// Reject over-threshold comments outright, no retry.
    Block,
    /// Offer a machine rewrite plus exactly one edit chance.
    PoliteOneEdit,
    /// Control condition: no moderation at all.
    #[strum(serialize = "nofilter")]
    #[serde(rename = "nofilter")]
    NoFilter,
}

/// Policy metadata for a (post, section) pair.
///
/// The server value is authoritative; a locally cached copy is a fallback
/// only and never overrides a freshly fetched value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub mode: PolicyMode,
    /// Classifier-probability cutoff in [0, 1] above which a comment is
    /// "over threshold".
    pub threshold: f64,
}

/// Result of one classifier call. Immutable once returned: a new edit
/// requires a new verdict, never a mutation of the old one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Offensiveness probability in [0, 1].
    pub probability: f64,
    /// `probability > threshold_applied`.
    pub over_threshold: bool,
    /// The threshold actually used for this call. May differ slightly from
    /// the configured one if the server recomputed it.
    pub threshold_applied: f64,
}

impl Verdict {
    /// Builds a verdict from a raw probability and the threshold that was
    /// applied, using the strict-greater-than rule.
    pub fn from_probability(probability: f64, threshold_applied: f64) -> Self {
        Self {
            probability,
            over_threshold: probability > threshold_applied,
            threshold_applied,
        }
    }
}

/// Output of the rewrite service.
///
/// `polite_text == None` means "no suggestion available" (generation failed
/// or returned empty) and must be handled as degraded service, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub polite_text: Option<String>,
}

impl Suggestion {
    /// Returns the suggestion text, treating empty strings as absent.
    pub fn text(&self) -> Option<&str> {
        self.polite_text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Which of the two bounded submission attempts a draft is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Attempt {
    First,
    Second,
}

impl Attempt {
    /// 1-based attempt number as recorded in intervention events.
    pub fn number(self) -> u8 {
        match self {
            Attempt::First => 1,
            Attempt::Second => 2,
        }
    }
}

/// A candidate comment, owned by the flow controller for the duration of one
/// submission attempt and discarded at any terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    /// Text as typed, possibly with a leading "@name " reply-mention prefix.
    pub raw_text: String,
    /// Parent comment when this draft is a reply. Referenced, never owned.
    pub reply_to: Option<CommentId>,
}

impl CommentDraft {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            reply_to: None,
        }
    }

    pub fn reply(raw_text: impl Into<String>, parent: CommentId) -> Self {
        Self {
            raw_text: raw_text.into(),
            reply_to: Some(parent),
        }
    }

    /// The text all services operate on: `raw_text` with one leading
    /// "@name " mention prefix stripped and surrounding whitespace trimmed.
    ///
    /// A bare "@name" with no following text is not treated as a mention
    /// prefix, so the comment body is never silently emptied.
    pub fn model_text(&self) -> String {
        let trimmed = self.raw_text.trim();
        let body = match trimmed.strip_prefix('@') {
            Some(rest) => match rest.split_once(char::is_whitespace) {
                Some((name, tail)) if !name.is_empty() && !tail.trim().is_empty() => tail,
                _ => trimmed,
            },
            None => trimmed,
        };
        body.trim().to_string()
    }
}

/// Moderation action recorded in an intervention event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionApplied {
    None,
    Blocked,
}

/// Decision rule recorded in an intervention event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    None,
    ForcedAcceptOneEdit,
}

/// Hint of which text variant was ultimately kept.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FinalChoice {
    Original,
    Polite,
    UserEdit,
    Unknown,
}

/// Immutable append-only record describing one decision point in a
/// submission flow. Write-once; emission is best-effort and must never block
/// user-visible progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionEvent {
    pub user_id: UserId,
    pub post_id: PostId,
    pub section: SectionOrd,
    pub correlation_id: CorrelationId,
    pub attempt_no: u8,
    /// Classifier probability of the first-attempt text. Absent under the
    /// `nofilter` control condition, where no classifier call is made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_probability: Option<f64>,
    pub threshold_applied: f64,
    pub action_applied: ActionApplied,
    pub decision_rule: DecisionRule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_polite_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_edit_text: Option<String>,
    /// Classifier probability of the user's edit, retained for audit even
    /// when the edit was not used as final text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_probability: Option<f64>,
    pub final_choice_hint: FinalChoice,
    /// Milliseconds from submission start to this decision point.
    pub latency_ms: u64,
}

/// Payload for persisting a comment, carrying every text variant the flow
/// produced so downstream readers can reconstruct what happened without
/// replaying the flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub user_id: UserId,
    pub post_id: PostId,
    pub section: SectionOrd,
    /// The first-attempt text as submitted to the classifier.
    pub original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_polite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_edit: Option<String>,
    /// The variant actually persisted for display. Absent means `original`.
    #[serde(rename = "final", skip_serializing_if = "Option::is_none")]
    pub final_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_applied: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<CommentId>,
}

/// Durable record returned by the comment store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: CommentId,
    pub user_id: UserId,
    pub post_id: PostId,
    pub section: SectionOrd,
    pub original: String,
    #[serde(default)]
    pub generated_polite: Option<String>,
    #[serde(default)]
    pub user_edit: Option<String>,
    #[serde(rename = "final", default)]
    pub final_text: Option<String>,
    #[serde(default)]
    pub reply_to: Option<CommentId>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub dislikes: i64,
}

impl CommentRecord {
    /// The text variant chosen for display.
    pub fn display_text(&self) -> &str {
        self.final_text.as_deref().unwrap_or(&self.original)
    }
}

/// Acknowledgement of a persist call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistReceipt {
    pub saved: bool,
    pub comment: CommentRecord,
}

/// Reaction kinds a viewer can toggle on a comment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Like,
    Dislike,
}

/// Server-reported reward state for one (post, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardStatus {
    #[serde(default)]
    pub eligible: bool,
    #[serde(default)]
    pub already_claimed: bool,
    /// Comment counts keyed by section ordinal.
    #[serde(default)]
    pub per_section_counts: BTreeMap<u8, u32>,
    #[serde(default)]
    pub total_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn policy_mode_wire_names() {
        assert_eq!(PolicyMode::Block.to_string(), "block");
        assert_eq!(PolicyMode::PoliteOneEdit.to_string(), "polite_one_edit");
        assert_eq!(PolicyMode::NoFilter.to_string(), "nofilter");
        assert_eq!(
            PolicyMode::from_str("nofilter").unwrap(),
            PolicyMode::NoFilter
        );
        assert_eq!(
            serde_json::to_string(&PolicyMode::PoliteOneEdit).unwrap(),
            "\"polite_one_edit\""
        );
    }

    #[test]
    fn verdict_uses_strict_greater_than() {
        let at = Verdict::from_probability(0.5, 0.5);
        assert!(!at.over_threshold);
        let above = Verdict::from_probability(0.500001, 0.5);
        assert!(above.over_threshold);
    }

    #[test]
    fn suggestion_empty_text_is_absent() {
        assert_eq!(Suggestion { polite_text: None }.text(), None);
        assert_eq!(
            Suggestion {
                polite_text: Some("   ".into())
            }
            .text(),
            None
        );
        assert_eq!(
            Suggestion {
                polite_text: Some("please be kind".into())
            }
            .text(),
            Some("please be kind")
        );
    }

    #[test]
    fn model_text_strips_mention_prefix() {
        let draft = CommentDraft::reply("@alice I disagree", CommentId(7));
        assert_eq!(draft.model_text(), "I disagree");
    }

    #[test]
    fn model_text_trims_whitespace() {
        let draft = CommentDraft::new("  hello world  ");
        assert_eq!(draft.model_text(), "hello world");
    }

    #[test]
    fn model_text_keeps_bare_mention() {
        // "@alice" with no body is not a prefix, it is the comment.
        let draft = CommentDraft::new("@alice");
        assert_eq!(draft.model_text(), "@alice");
        let draft = CommentDraft::new("@alice   ");
        assert_eq!(draft.model_text(), "@alice");
    }

    #[test]
    fn model_text_keeps_mid_text_mention() {
        let draft = CommentDraft::new("thanks @bob for the link");
        assert_eq!(draft.model_text(), "thanks @bob for the link");
    }

    #[test]
    fn attempt_numbers() {
        assert_eq!(Attempt::First.number(), 1);
        assert_eq!(Attempt::Second.number(), 2);
        assert!(Attempt::First < Attempt::Second);
    }

    #[test]
    fn correlation_ids_are_unique() {
        assert_ne!(CorrelationId::generate(), CorrelationId::generate());
    }

    #[test]
    fn new_comment_serializes_final_field_name() {
        let payload = NewComment {
            user_id: UserId("u_abc".into()),
            post_id: PostId(1),
            section: SectionOrd(2),
            original: "orig".into(),
            generated_polite: Some("polite".into()),
            user_edit: None,
            final_text: Some("polite".into()),
            threshold_applied: Some(0.5),
            reply_to: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["final"], "polite");
        assert!(json.get("user_edit").is_none());
        assert!(json.get("reply_to").is_none());
    }

    #[test]
    fn comment_record_display_text_falls_back_to_original() {
        let rec = CommentRecord {
            id: CommentId(1),
            user_id: UserId("u".into()),
            post_id: PostId(1),
            section: SectionOrd(1),
            original: "hello".into(),
            generated_polite: None,
            user_edit: None,
            final_text: None,
            reply_to: None,
            created_at: "2026-01-01T00:00:00Z".into(),
            likes: 0,
            dislikes: 0,
        };
        assert_eq!(rec.display_text(), "hello");
    }

    #[test]
    fn event_wire_names() {
        assert_eq!(ActionApplied::Blocked.to_string(), "blocked");
        assert_eq!(
            DecisionRule::ForcedAcceptOneEdit.to_string(),
            "forced_accept_one_edit"
        );
        assert_eq!(FinalChoice::UserEdit.to_string(), "user_edit");
        assert_eq!(
            serde_json::to_string(&FinalChoice::UserEdit).unwrap(),
            "\"user_edit\""
        );
    }

    proptest! {
        #[test]
        fn model_text_never_panics_and_is_trimmed(raw in ".{0,200}") {
            let text = CommentDraft::new(raw).model_text();
            prop_assert_eq!(text.trim(), text.as_str());
        }

        #[test]
        fn mention_prefix_always_removed(name in "[a-z]{1,12}", body in "[a-z ]{1,40}") {
            prop_assume!(!body.trim().is_empty());
            let draft = CommentDraft::new(format!("@{name} {body}"));
            prop_assert_eq!(draft.model_text(), body.trim());
        }
    }
}
