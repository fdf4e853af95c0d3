// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted moderation adapter.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use lifeline_core::{AdapterType, LifelineError, ModerationAdapter, ModerationVerdict};

#[derive(Debug, Clone)]
enum Step {
    Verdict(ModerationVerdict),
    Fail,
    Hang(Duration),
    Panic,
}

/// Moderation adapter that replays a script.
///
/// Queued steps are consumed first; afterwards the fallback step repeats.
pub struct MockModeration {
    queue: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
}

impl MockModeration {
    fn repeating(step: Step) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: step,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always returns a clean pass.
    pub fn allowing() -> Self {
        Self::repeating(Step::Verdict(ModerationVerdict::allow()))
    }

    /// Always returns the given verdict.
    pub fn with_verdict(verdict: ModerationVerdict) -> Self {
        Self::repeating(Step::Verdict(verdict))
    }

    /// Always errors.
    pub fn failing() -> Self {
        Self::repeating(Step::Fail)
    }

    /// Sleeps for `delay` before passing. Longer than the gateway timeout
    /// means the call is abandoned.
    pub fn hanging(delay: Duration) -> Self {
        Self::repeating(Step::Hang(delay))
    }

    /// Panics inside every `moderate` call, taking the routing task down.
    pub fn panicking() -> Self {
        Self::repeating(Step::Panic)
    }

    /// Queue a one-off verdict ahead of the fallback.
    pub async fn push_verdict(&self, verdict: ModerationVerdict) {
        self.queue.lock().await.push_back(Step::Verdict(verdict));
    }

    /// Queue a one-off failure ahead of the fallback.
    pub async fn push_failure(&self) {
        self.queue.lock().await.push_back(Step::Fail);
    }

    /// Number of `moderate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockModeration {
    fn default() -> Self {
        Self::allowing()
    }
}

crate::mock_plugin!(MockModeration, "mock-moderation", AdapterType::Moderation);

#[async_trait]
impl ModerationAdapter for MockModeration {
    async fn moderate(&self, _text: &str) -> Result<ModerationVerdict, LifelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .queue
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match step {
            Step::Verdict(verdict) => Ok(verdict),
            Step::Fail => Err(LifelineError::Moderation {
                message: "mock moderation failure".into(),
                source: None,
            }),
            Step::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Ok(ModerationVerdict::allow())
            }
            Step::Panic => panic!("mock moderation panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_steps_run_before_fallback() {
        let moderation = MockModeration::allowing();
        moderation
            .push_verdict(ModerationVerdict::crisis(["self-harm"]))
            .await;
        moderation.push_failure().await;

        assert!(moderation.moderate("a").await.unwrap().crisis_signal);
        assert!(moderation.moderate("b").await.is_err());
        assert!(moderation.moderate("c").await.unwrap().allowed);
        assert_eq!(moderation.calls(), 3);
    }
}
