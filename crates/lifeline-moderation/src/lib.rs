// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible moderation adapter for Lifeline.
//!
//! Implements [`ModerationAdapter`] against any `/v1/moderations` endpoint.
//! The verdict is derived from the endpoint's own category flags: nothing
//! here inspects the text. Any transport, status or parse failure is an
//! error, which the gateway turns into a fail-closed verdict.

pub mod types;

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use lifeline_config::model::ModerationConfig;
use lifeline_core::{
    AdapterType, HealthStatus, LifelineError, ModerationAdapter, ModerationVerdict,
    PluginAdapter,
};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::types::{ApiErrorResponse, ModerationRequest, ModerationResponse, ModerationResult};

/// Moderation client for an OpenAI-compatible endpoint.
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiModeration {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    crisis_categories: BTreeSet<String>,
}

impl OpenAiModeration {
    /// Creates the adapter from configuration.
    pub fn new(config: &ModerationConfig) -> Result<Self, LifelineError> {
        let api_key = resolve_api_key(&config.api_key)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| LifelineError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LifelineError::Moderation {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        info!(
            endpoint = config.endpoint,
            model = config.model,
            "moderation adapter initialized"
        );

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            crisis_categories: config.crisis_categories.iter().cloned().collect(),
        })
    }

    /// Map one moderation result to a verdict.
    fn verdict_for(&self, result: &ModerationResult) -> ModerationVerdict {
        let categories: BTreeSet<String> = result
            .categories
            .iter()
            .filter(|(_, flagged)| **flagged)
            .map(|(name, _)| name.clone())
            .collect();
        let crisis_signal = categories
            .iter()
            .any(|name| self.crisis_categories.contains(name));

        ModerationVerdict {
            allowed: !result.flagged && categories.is_empty(),
            crisis_signal,
            categories,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiModeration {
    fn name(&self) -> &str {
        "openai-moderation"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Moderation
    }

    async fn health_check(&self) -> Result<HealthStatus, LifelineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LifelineError> {
        debug!("moderation adapter shutting down");
        Ok(())
    }
}

#[async_trait]
impl ModerationAdapter for OpenAiModeration {
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, LifelineError> {
        let request = ModerationRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| LifelineError::Moderation {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| LifelineError::Moderation {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "moderation API error ({}): {}",
                    api_err.error.type_.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                ),
                Err(_) => format!("moderation API returned {status}"),
            };
            return Err(LifelineError::Moderation {
                message,
                source: None,
            });
        }

        let parsed: ModerationResponse =
            serde_json::from_str(&body).map_err(|e| LifelineError::Moderation {
                message: format!("failed to parse moderation response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let result = parsed.results.first().ok_or_else(|| LifelineError::Moderation {
            message: "moderation response contained no results".into(),
            source: None,
        })?;

        let verdict = self.verdict_for(result);
        debug!(
            model = parsed.model,
            allowed = verdict.allowed,
            crisis_signal = verdict.crisis_signal,
            "moderation response mapped"
        );
        Ok(verdict)
    }
}

/// Resolves the API key: config first, then `OPENAI_API_KEY`.
fn resolve_api_key(config_key: &Option<String>) -> Result<SecretString, LifelineError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(SecretString::from(key.clone()));
    }

    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            LifelineError::Config(
                "moderation API key not found. Set moderation.api_key in config or OPENAI_API_KEY environment variable.".into(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(endpoint: String) -> OpenAiModeration {
        let config = ModerationConfig {
            endpoint,
            api_key: Some("sk-mod".into()),
            timeout_ms: 500,
            ..Default::default()
        };
        OpenAiModeration::new(&config).unwrap()
    }

    fn result(flagged: bool, categories: &[(&str, bool)]) -> serde_json::Value {
        let categories: serde_json::Map<String, serde_json::Value> = categories
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::Bool(*v)))
            .collect();
        serde_json::json!({
            "id": "modr-1",
            "model": "omni-moderation-latest",
            "results": [{"flagged": flagged, "categories": categories, "category_scores": {}}]
        })
    }

    async fn verdict_for_body(body: serde_json::Value) -> ModerationVerdict {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/moderations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        adapter(format!("{}/v1/moderations", server.uri()))
            .moderate("some text")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn clean_text_is_allowed() {
        let verdict =
            verdict_for_body(result(false, &[("self-harm", false), ("violence", false)])).await;
        assert_eq!(verdict, ModerationVerdict::allow());
    }

    #[tokio::test]
    async fn self_harm_flag_raises_crisis_signal() {
        let verdict = verdict_for_body(result(
            true,
            &[("self-harm/intent", true), ("violence", false)],
        ))
        .await;
        assert!(verdict.crisis_signal);
        assert!(!verdict.allowed);
        assert!(verdict.categories.contains("self-harm/intent"));
        assert_eq!(verdict.categories.len(), 1);
    }

    #[tokio::test]
    async fn other_flag_blocks_without_crisis_signal() {
        let verdict =
            verdict_for_body(result(true, &[("harassment", true), ("self-harm", false)])).await;
        assert_eq!(verdict, ModerationVerdict::blocked(["harassment"]));
    }

    #[tokio::test]
    async fn sends_model_input_and_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/moderations"))
            .and(header("authorization", "Bearer sk-mod"))
            .and(body_json(serde_json::json!({
                "model": "omni-moderation-latest",
                "input": "hello"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(result(false, &[])))
            .expect(1)
            .mount(&server)
            .await;

        let verdict = adapter(format!("{}/v1/moderations", server.uri()))
            .moderate("hello")
            .await
            .unwrap();
        assert!(verdict.allowed);
    }

    #[tokio::test]
    async fn server_error_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": {"type": "server_error", "message": "boom"}
            })))
            .mount(&server)
            .await;

        let err = adapter(format!("{}/v1/moderations", server.uri()))
            .moderate("hello")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("server_error"), "got: {err}");
    }

    #[tokio::test]
    async fn empty_results_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})),
            )
            .mount(&server)
            .await;

        let result = adapter(format!("{}/v1/moderations", server.uri()))
            .moderate("hello")
            .await;
        assert!(matches!(result, Err(LifelineError::Moderation { .. })));
    }

    #[tokio::test]
    async fn garbage_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let result = adapter(format!("{}/v1/moderations", server.uri()))
            .moderate("hello")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn slow_endpoint_hits_client_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(result(false, &[]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let result = adapter(format!("{}/v1/moderations", server.uri()))
            .moderate("hello")
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn custom_crisis_categories_are_honoured() {
        let config = ModerationConfig {
            api_key: Some("k".into()),
            crisis_categories: vec!["violence".into()],
            ..Default::default()
        };
        let adapter = OpenAiModeration::new(&config).unwrap();
        let result = ModerationResult {
            flagged: true,
            categories: [("violence".to_string(), true)].into_iter().collect(),
            category_scores: Default::default(),
        };
        assert!(adapter.verdict_for(&result).crisis_signal);
        assert_eq!(adapter.adapter_type(), AdapterType::Moderation);
    }
}
