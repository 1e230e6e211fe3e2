// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the experiment backend endpoints.
//!
//! Field names follow the backend's snake_case JSON. Domain types from
//! `politeflow-core` are reused directly where the shapes coincide
//! (`NewComment`, `CommentRecord`, `InterventionEvent`, `RewardStatus`).

use serde::{Deserialize, Serialize};

use politeflow_core::types::{CommentId, PolicyMode, PostId, ReactionKind, SectionOrd, UserId};

/// Request body for `POST /bert/predict`.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequest<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

/// Response body from `POST /bert/predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyResponse {
    /// Offensiveness probability in [0, 1].
    pub probability: f64,
    /// Hard label from the classifier head, when the backend includes it.
    #[serde(default)]
    pub predicted_class: Option<i64>,
    /// Threshold the server actually applied, when it recomputed one.
    #[serde(default)]
    pub threshold_applied: Option<f64>,
}

/// Request body for `POST /kobart/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub text: &'a str,
    pub post_id: PostId,
    pub section: SectionOrd,
}

/// Response body from `POST /kobart/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    /// Absent or empty when generation failed upstream.
    #[serde(default)]
    pub polite_text: Option<String>,
    #[serde(default)]
    pub policy_mode: Option<PolicyMode>,
    #[serde(default)]
    pub threshold_applied: Option<f64>,
}

/// Response body from `GET /experiment/meta`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentMetaResponse {
    pub policy_mode: PolicyMode,
    pub threshold: f64,
}

/// Request body for `POST /reactions/toggle`.
#[derive(Debug, Clone, Serialize)]
pub struct ReactionRequest<'a> {
    pub comment_id: CommentId,
    pub user_id: &'a UserId,
    pub reaction: ReactionKind,
}

/// Response body from `POST /reward/claim`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimResponse {
    pub ok: bool,
    #[serde(default)]
    pub openchat_url: Option<String>,
    #[serde(default)]
    pub openchat_pw: Option<String>,
}
