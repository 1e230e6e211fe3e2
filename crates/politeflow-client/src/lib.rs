// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP adapters for the Politeflow experiment backend.
//!
//! [`ExperimentClient`] implements every adapter trait from
//! `politeflow-core` against the backend's REST endpoints: the BERT toxicity
//! classifier, the KoBART rewriter, comment storage, the intervention event
//! log, experiment metadata, reactions, and reward state.

pub mod http;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use politeflow_config::model::ServiceConfig;
use politeflow_core::error::PoliteflowError;
use politeflow_core::traits::{
    ClassifierAdapter, CommentStoreAdapter, EventSinkAdapter, PolicyAdapter, SuggesterAdapter,
};
use politeflow_core::types::{
    CommentId, CommentRecord, InterventionEvent, NewComment, PersistReceipt, PolicyConfig,
    PostId, ReactionKind, RewardStatus, SectionOrd, Suggestion, UserId, Verdict,
};

use crate::http::HttpClient;
use crate::types::{
    ClaimResponse, ClassifyRequest, ClassifyResponse, ExperimentMetaResponse, GenerateRequest,
    GenerateResponse, ReactionRequest,
};

/// One client for every experiment backend endpoint.
///
/// Cheap to clone; all endpoint groups share a single connection pool.
#[derive(Debug, Clone)]
pub struct ExperimentClient {
    http: HttpClient,
}

impl ExperimentClient {
    /// Creates a client from the service configuration section.
    pub fn new(config: &ServiceConfig) -> Result<Self, PoliteflowError> {
        let client = Self {
            http: HttpClient::new(config)?,
        };
        info!(base_url = config.base_url.as_str(), "experiment client initialized");
        Ok(client)
    }

    /// Creates a client from explicit parts (tests, embedding).
    pub fn from_parts(
        base_url: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, PoliteflowError> {
        Ok(Self {
            http: HttpClient::from_parts(base_url, timeout, max_retries)?,
        })
    }

    /// Fetches the reward state for one (post, user) pair.
    pub async fn reward_status(
        &self,
        post_id: PostId,
        user: &UserId,
    ) -> Result<RewardStatus, PoliteflowError> {
        self.http
            .get_json(
                &format!("/reward/status/{}", post_id.0),
                &[("user_id", user.0.clone())],
            )
            .await
    }

    /// Claims the reward for one (post, user) pair.
    pub async fn claim_reward(
        &self,
        post_id: PostId,
        user: &UserId,
    ) -> Result<ClaimResponse, PoliteflowError> {
        self.http
            .post_json(
                "/reward/claim",
                &serde_json::json!({ "post_id": post_id, "user_id": user }),
            )
            .await
    }
}

#[async_trait]
impl ClassifierAdapter for ExperimentClient {
    async fn classify(
        &self,
        post_id: PostId,
        text: &str,
        threshold: f64,
    ) -> Result<Verdict, PoliteflowError> {
        let request = ClassifyRequest {
            text,
            post_id: Some(post_id),
            threshold: Some(threshold),
        };
        let response: ClassifyResponse = self.http.post_json("/bert/predict", &request).await?;

        // The server-recomputed threshold wins when present.
        let applied = response.threshold_applied.unwrap_or(threshold);
        let verdict = Verdict::from_probability(response.probability, applied);
        debug!(
            probability = verdict.probability,
            threshold_applied = verdict.threshold_applied,
            over = verdict.over_threshold,
            "classifier verdict"
        );
        Ok(verdict)
    }
}

#[async_trait]
impl SuggesterAdapter for ExperimentClient {
    async fn suggest(
        &self,
        post_id: PostId,
        section: SectionOrd,
        text: &str,
    ) -> Result<Suggestion, PoliteflowError> {
        let request = GenerateRequest {
            text,
            post_id,
            section,
        };
        let response: GenerateResponse = self.http.post_json("/kobart/generate", &request).await?;
        Ok(Suggestion {
            polite_text: response.polite_text,
        })
    }
}

#[async_trait]
impl CommentStoreAdapter for ExperimentClient {
    async fn persist(&self, comment: &NewComment) -> Result<PersistReceipt, PoliteflowError> {
        let (status, body) = self.http.post_raw("/comments/add", comment).await?;

        if status.is_client_error() {
            // The server declined the save (validation, ban). Not transient.
            return Err(PoliteflowError::PersistenceRejected {
                message: format!("comment store declined save ({status}): {body}"),
            });
        }
        if !status.is_success() {
            return Err(PoliteflowError::service(format!(
                "/comments/add returned {status}: {body}"
            )));
        }
        serde_json::from_str(&body).map_err(|e| PoliteflowError::Service {
            message: format!("failed to parse persist response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    async fn list(
        &self,
        post_id: PostId,
        section: SectionOrd,
        viewer: &UserId,
    ) -> Result<Vec<CommentRecord>, PoliteflowError> {
        self.http
            .get_json(
                &format!("/comments/{}", post_id.0),
                &[
                    ("section", section.0.to_string()),
                    ("viewer_user_id", viewer.0.clone()),
                ],
            )
            .await
    }

    async fn toggle_reaction(
        &self,
        comment_id: CommentId,
        viewer: &UserId,
        kind: ReactionKind,
    ) -> Result<(), PoliteflowError> {
        let request = ReactionRequest {
            comment_id,
            user_id: viewer,
            reaction: kind,
        };
        let (status, body) = self.http.post_raw("/reactions/toggle", &request).await?;
        if !status.is_success() {
            return Err(PoliteflowError::service(format!(
                "/reactions/toggle returned {status}: {body}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EventSinkAdapter for ExperimentClient {
    async fn log_event(&self, event: &InterventionEvent) -> Result<(), PoliteflowError> {
        let (status, body) = self.http.post_raw("/events/log", event).await?;
        if !status.is_success() {
            return Err(PoliteflowError::service(format!(
                "/events/log returned {status}: {body}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PolicyAdapter for ExperimentClient {
    async fn fetch_policy(
        &self,
        post_id: PostId,
        section: SectionOrd,
    ) -> Result<PolicyConfig, PoliteflowError> {
        let response: ExperimentMetaResponse = self
            .http
            .get_json(
                "/experiment/meta",
                &[
                    ("post_id", post_id.0.to_string()),
                    ("section", section.0.to_string()),
                ],
            )
            .await
            .map_err(|e| PoliteflowError::PolicyUnavailable {
                message: e.to_string(),
            })?;
        Ok(PolicyConfig {
            mode: response.policy_mode,
            threshold: response.threshold,
        })
    }
}
