// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thin HTTP client for the Anthropic Messages endpoint.
//!
//! One non-streaming call per reply. Overload and rate-limit responses get a
//! single delayed retry; everything else is returned to the caller, which
//! turns it into the fallback text.

use std::time::Duration;

use lifeline_core::LifelineError;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// Statuses that mean "try again shortly": rate limited, server error,
/// unavailable, overloaded.
const RETRYABLE: [u16; 4] = [429, 500, 503, 529];

/// How a single call ended.
enum Outcome {
    Done(MessageResponse),
    Retryable(LifelineError),
    Failed(LifelineError),
}

/// Messages API client. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    model: String,
    url: String,
    attempts: u32,
    retry_delay: Duration,
}

impl AnthropicClient {
    /// Build a client that authenticates with `api_key`.
    ///
    /// `timeout` bounds each HTTP call; the router applies its own overall
    /// deadline on top.
    pub fn new(
        api_key: &SecretString,
        api_version: &str,
        model: String,
        timeout: Duration,
    ) -> Result<Self, LifelineError> {
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| LifelineError::Config(format!("provider API key is not a valid header: {e}")))?;
        key.set_sensitive(true);
        let version = HeaderValue::from_str(api_version)
            .map_err(|e| LifelineError::Config(format!("provider.api_version is not a valid header: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", version);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| provider_error("could not build HTTP client", e))?;

        Ok(Self {
            http,
            model,
            url: MESSAGES_URL.to_string(),
            attempts: 2,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Model used when the request does not name one.
    pub fn default_model(&self) -> &str {
        &self.model
    }

    /// Point the client at a mock server and shorten the retry delay.
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.url = url;
        self.retry_delay = Duration::from_millis(10);
        self
    }

    /// Send `request` and return the full response.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, LifelineError> {
        let mut attempt = 1;
        loop {
            match self.send_once(request).await? {
                Outcome::Done(response) => return Ok(response),
                Outcome::Failed(e) => return Err(e),
                Outcome::Retryable(e) if attempt >= self.attempts => return Err(e),
                Outcome::Retryable(e) => {
                    warn!(attempt, error = %e, "provider busy, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn send_once(&self, request: &MessageRequest) -> Result<Outcome, LifelineError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| provider_error("request failed", e))?;

        let status = response.status();
        debug!(status = %status, "provider responded");

        let body = response
            .text()
            .await
            .map_err(|e| provider_error("could not read response body", e))?;

        if status.is_success() {
            let parsed = serde_json::from_str::<MessageResponse>(&body)
                .map_err(|e| provider_error("unexpected response shape", e))?;
            return Ok(Outcome::Done(parsed));
        }

        let error = LifelineError::Provider {
            message: describe_failure(status, &body),
            source: None,
        };
        if RETRYABLE.contains(&status.as_u16()) {
            Ok(Outcome::Retryable(error))
        } else {
            Ok(Outcome::Failed(error))
        }
    }
}

/// Summarise a failed call. Only the API's own error type and message are
/// kept; an unrecognised body is reduced to the status.
fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api) => format!("Anthropic API {status} ({}): {}", api.error.type_, api.error.message),
        Err(_) => format!("Anthropic API {status}"),
    }
}

fn provider_error<E>(context: &str, e: E) -> LifelineError
where
    E: std::error::Error + Send + Sync + 'static,
{
    LifelineError::Provider {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}
