// SPDX-FileCopyrightText: 2026 Politeflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP plumbing for the experiment backend.
//!
//! Provides [`HttpClient`], which handles request construction, JSON
//! decoding, and transient error retry. All endpoint wrappers in this crate
//! go through it.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use politeflow_config::model::ServiceConfig;
use politeflow_core::PoliteflowError;

/// HTTP client for experiment backend communication.
///
/// Manages connection pooling, per-request timeout, and retry on transient
/// errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl HttpClient {
    /// Creates a new client from the service configuration section.
    pub fn new(config: &ServiceConfig) -> Result<Self, PoliteflowError> {
        Self::from_parts(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )
    }

    /// Creates a new client from explicit parts.
    pub fn from_parts(
        base_url: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, PoliteflowError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PoliteflowError::Service {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a POST with a JSON body and returns the final status and body.
    ///
    /// On transient status (429, 500, 503) retries after a 1-second delay,
    /// up to `max_retries` times. Transport failures are never retried here:
    /// the submission flow treats them as a retryable terminal for the
    /// current attempt.
    pub(crate) async fn post_raw<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(StatusCode, String), PoliteflowError> {
        let url = format!("{}{path}", self.base_url);
        let mut last: Option<(StatusCode, String)> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, path, "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| PoliteflowError::Service {
                    message: format!("POST {path} failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, path, "response received");

            let text = response.text().await.map_err(|e| PoliteflowError::Service {
                message: format!("failed to read response body from {path}: {e}"),
                source: Some(Box::new(e)),
            })?;

            if is_transient(status) && attempt < self.max_retries {
                warn!(status = %status, path, "transient error, will retry");
                last = Some((status, text));
                continue;
            }

            return Ok((status, text));
        }

        // Only reachable when every attempt hit a transient status.
        Ok(last.unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, String::new())))
    }

    /// Sends a GET with query parameters and returns the final status and body.
    pub(crate) async fn get_raw(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(StatusCode, String), PoliteflowError> {
        let url = format!("{}{path}", self.base_url);
        let mut last: Option<(StatusCode, String)> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, path, "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| PoliteflowError::Service {
                    message: format!("GET {path} failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, path, "response received");

            let text = response.text().await.map_err(|e| PoliteflowError::Service {
                message: format!("failed to read response body from {path}: {e}"),
                source: Some(Box::new(e)),
            })?;

            if is_transient(status) && attempt < self.max_retries {
                warn!(status = %status, path, "transient error, will retry");
                last = Some((status, text));
                continue;
            }

            return Ok((status, text));
        }

        Ok(last.unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, String::new())))
    }

    /// POST returning a decoded JSON body, mapping any non-2xx to a service error.
    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PoliteflowError> {
        let (status, text) = self.post_raw(path, body).await?;
        decode(path, status, &text)
    }

    /// GET returning a decoded JSON body, mapping any non-2xx to a service error.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PoliteflowError> {
        let (status, text) = self.get_raw(path, query).await?;
        decode(path, status, &text)
    }
}

fn decode<T: DeserializeOwned>(
    path: &str,
    status: StatusCode,
    text: &str,
) -> Result<T, PoliteflowError> {
    if !status.is_success() {
        return Err(PoliteflowError::service(format!(
            "{path} returned {status}: {text}"
        )));
    }
    serde_json::from_str(text).map_err(|e| PoliteflowError::Service {
        message: format!("failed to parse response from {path}: {e}"),
        source: Some(Box::new(e)),
    })
}

/// True for HTTP status codes that indicate transient errors worth retrying.
fn is_transient(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
