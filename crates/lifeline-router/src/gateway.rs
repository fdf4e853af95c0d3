// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moderation gateway in front of every AI reply.
//!
//! `screen` asks the external moderation capability for a verdict and fails
//! closed on error or timeout. `respond` turns the verdict into a reply: only
//! a clean pass ever reaches the AI capability.

use std::sync::Arc;
use std::time::Duration;

use lifeline_core::resources::{CRISIS_DIRECTIVE, SAFETY_TEMPLATE, UNAVAILABLE_TEMPLATE};
use lifeline_core::{ChatMessage, ChatReply, ModerationAdapter, ModerationVerdict, ProviderAdapter};
use tracing::{debug, warn};

/// What the gateway does with a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// Allowed with no crisis signal: the AI capability answers.
    Pass,
    /// Crisis signal present, whatever `allowed` says.
    CrisisBlock,
    /// Disallowed without a crisis signal.
    SoftBlock,
}

impl GatewayOutcome {
    /// Decide the outcome for a verdict. The crisis signal always wins.
    pub fn for_verdict(verdict: &ModerationVerdict) -> Self {
        if verdict.crisis_signal {
            GatewayOutcome::CrisisBlock
        } else if verdict.allowed {
            GatewayOutcome::Pass
        } else {
            GatewayOutcome::SoftBlock
        }
    }

    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayOutcome::Pass => "pass",
            GatewayOutcome::CrisisBlock => "crisis_block",
            GatewayOutcome::SoftBlock => "soft_block",
        }
    }
}

/// Screens chat messages and produces replies.
///
/// Holds no mutable state; concurrent requests share one instance.
pub struct ModerationGateway {
    moderation: Arc<dyn ModerationAdapter>,
    provider: Arc<dyn ProviderAdapter>,
    moderation_timeout: Duration,
    provider_timeout: Duration,
}

impl ModerationGateway {
    pub fn new(
        moderation: Arc<dyn ModerationAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        moderation_timeout: Duration,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            moderation,
            provider,
            moderation_timeout,
            provider_timeout,
        }
    }

    /// Obtain a verdict for the message.
    ///
    /// Any error or timeout from the capability yields
    /// [`ModerationVerdict::fail_closed`].
    pub async fn screen(&self, message: &ChatMessage) -> ModerationVerdict {
        match tokio::time::timeout(
            self.moderation_timeout,
            self.moderation.moderate(&message.content),
        )
        .await
        {
            Ok(Ok(verdict)) => {
                debug!(
                    allowed = verdict.allowed,
                    crisis_signal = verdict.crisis_signal,
                    categories = verdict.categories.len(),
                    "moderation verdict"
                );
                verdict
            }
            Ok(Err(e)) => {
                warn!(error = %e, "moderation failed, failing closed");
                lifeline_prometheus::record_moderation_failure();
                ModerationVerdict::fail_closed()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.moderation_timeout.as_millis() as u64,
                    "moderation timed out, failing closed"
                );
                lifeline_prometheus::record_moderation_failure();
                ModerationVerdict::fail_closed()
            }
        }
    }

    /// Produce the reply for a screened message.
    ///
    /// The AI capability is called only for [`GatewayOutcome::Pass`]. Its
    /// output is returned verbatim; if it fails or times out, a fixed
    /// fallback text is returned instead of the error.
    pub async fn respond(&self, message: &ChatMessage, verdict: &ModerationVerdict) -> ChatReply {
        match GatewayOutcome::for_verdict(verdict) {
            GatewayOutcome::CrisisBlock => ChatReply::Crisis {
                content: CRISIS_DIRECTIVE.to_string(),
                region_code: message.region_code,
            },
            GatewayOutcome::SoftBlock => ChatReply::Blocked {
                content: SAFETY_TEMPLATE.to_string(),
            },
            GatewayOutcome::Pass => {
                match tokio::time::timeout(self.provider_timeout, self.provider.generate(message))
                    .await
                {
                    Ok(Ok(content)) => ChatReply::Reply { content },
                    Ok(Err(e)) => {
                        warn!(error = %e, "AI provider failed, returning fallback");
                        ChatReply::Unavailable {
                            content: UNAVAILABLE_TEMPLATE.to_string(),
                        }
                    }
                    Err(_) => {
                        warn!(
                            timeout_ms = self.provider_timeout.as_millis() as u64,
                            "AI provider timed out, returning fallback"
                        );
                        ChatReply::Unavailable {
                            content: UNAVAILABLE_TEMPLATE.to_string(),
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use lifeline_core::{AdapterType, HealthStatus, LifelineError, PluginAdapter};

    use super::*;

    enum Script {
        Verdict(ModerationVerdict),
        Fail,
        Hang,
    }

    struct ScriptedModeration(Script);

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    macro_rules! plugin {
        ($ty:ty, $name:expr, $kind:expr) => {
            #[async_trait]
            impl PluginAdapter for $ty {
                fn name(&self) -> &str {
                    $name
                }
                fn version(&self) -> semver::Version {
                    semver::Version::new(0, 1, 0)
                }
                fn adapter_type(&self) -> AdapterType {
                    $kind
                }
                async fn health_check(&self) -> Result<HealthStatus, LifelineError> {
                    Ok(HealthStatus::Healthy)
                }
                async fn shutdown(&self) -> Result<(), LifelineError> {
                    Ok(())
                }
            }
        };
    }

    plugin!(ScriptedModeration, "scripted", AdapterType::Moderation);
    plugin!(CountingProvider, "counting", AdapterType::Provider);

    #[async_trait]
    impl ModerationAdapter for ScriptedModeration {
        async fn moderate(&self, _text: &str) -> Result<ModerationVerdict, LifelineError> {
            match &self.0 {
                Script::Verdict(v) => Ok(v.clone()),
                Script::Fail => Err(LifelineError::Moderation {
                    message: "upstream 500".into(),
                    source: None,
                }),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(ModerationVerdict::allow())
                }
            }
        }
    }

    #[async_trait]
    impl ProviderAdapter for CountingProvider {
        async fn generate(&self, message: &ChatMessage) -> Result<String, LifelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LifelineError::Provider {
                    message: "overloaded".into(),
                    source: None,
                });
            }
            Ok(format!("echo: {}", message.content))
        }
    }

    fn gateway(script: Script, fail_provider: bool) -> (ModerationGateway, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail: fail_provider,
        });
        let gw = ModerationGateway::new(
            Arc::new(ScriptedModeration(script)),
            provider.clone(),
            Duration::from_millis(50),
            Duration::from_millis(50),
        );
        (gw, provider)
    }

    async fn run(gw: &ModerationGateway, text: &str) -> ChatReply {
        let msg = ChatMessage::user(text);
        let verdict = gw.screen(&msg).await;
        gw.respond(&msg, &verdict).await
    }

    #[test]
    fn crisis_signal_wins_over_allowed() {
        let mut v = ModerationVerdict::allow();
        v.crisis_signal = true;
        assert_eq!(GatewayOutcome::for_verdict(&v), GatewayOutcome::CrisisBlock);
        assert_eq!(
            GatewayOutcome::for_verdict(&ModerationVerdict::crisis(["self-harm"])),
            GatewayOutcome::CrisisBlock
        );
        assert_eq!(
            GatewayOutcome::for_verdict(&ModerationVerdict::blocked(["harassment"])),
            GatewayOutcome::SoftBlock
        );
        assert_eq!(
            GatewayOutcome::for_verdict(&ModerationVerdict::allow()),
            GatewayOutcome::Pass
        );
    }

    #[tokio::test]
    async fn pass_returns_provider_output_verbatim() {
        let (gw, provider) = gateway(Script::Verdict(ModerationVerdict::allow()), false);
        let reply = run(&gw, "hello").await;
        assert_eq!(reply, ChatReply::Reply { content: "echo: hello".into() });
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn crisis_block_never_calls_provider() {
        let (gw, provider) = gateway(
            Script::Verdict(ModerationVerdict::crisis(["self-harm/intent"])),
            false,
        );
        let reply = run(&gw, "text").await;
        assert!(reply.crisis_mode());
        assert!(!reply.blocked());
        assert_eq!(reply.content(), CRISIS_DIRECTIVE);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn soft_block_never_calls_provider() {
        let (gw, provider) = gateway(
            Script::Verdict(ModerationVerdict::blocked(["harassment"])),
            false,
        );
        let reply = run(&gw, "text").await;
        assert!(reply.blocked());
        assert!(!reply.crisis_mode());
        assert_eq!(reply.content(), SAFETY_TEMPLATE);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn moderation_error_fails_closed() {
        let (gw, provider) = gateway(Script::Fail, false);
        let msg = ChatMessage::user("text");
        assert_eq!(gw.screen(&msg).await, ModerationVerdict::fail_closed());
        let reply = run(&gw, "text").await;
        assert_eq!(reply, ChatReply::Blocked { content: SAFETY_TEMPLATE.into() });
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn moderation_timeout_fails_closed() {
        let (gw, provider) = gateway(Script::Hang, false);
        let reply = run(&gw, "text").await;
        assert!(reply.blocked());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_failure_returns_fallback_not_error() {
        let (gw, provider) = gateway(Script::Verdict(ModerationVerdict::allow()), true);
        let reply = run(&gw, "hello").await;
        assert_eq!(
            reply,
            ChatReply::Unavailable {
                content: UNAVAILABLE_TEMPLATE.into()
            }
        );
        assert!(!reply.blocked());
        assert!(!reply.crisis_mode());
        assert!(!reply.content().contains("overloaded"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn crisis_reply_carries_region() {
        let (gw, _) = gateway(
            Script::Verdict(ModerationVerdict::crisis(["self-harm"])),
            false,
        );
        let msg = ChatMessage::user("text").with_region("IE".parse().unwrap());
        let verdict = gw.screen(&msg).await;
        match gw.respond(&msg, &verdict).await {
            ChatReply::Crisis { region_code, .. } => {
                assert_eq!(region_code.unwrap().as_str(), "IE")
            }
            other => panic!("expected crisis reply, got {other:?}"),
        }
    }
}
