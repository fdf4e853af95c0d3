// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, non-blocking relay between the router and a notifier.
//!
//! The router reserves a queue slot with [`RelayHandle::reserve`] before it
//! writes the audit row, so the row records whether a notification is really
//! on its way, and sends through the permit afterwards. A full or closed
//! queue yields no permit and is logged; the caller never waits. Delivery,
//! timeouts, retries and shutdown draining all happen on the worker task.

use std::sync::Arc;
use std::time::Duration;

use lifeline_config::model::NotifyConfig;
use lifeline_core::{CrisisNotification, LifelineError, NotificationAdapter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Delivery policy for the relay worker.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bound of the notification queue.
    pub queue_capacity: usize,
    /// Attempts per notification, including the first. At least 1.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubled for each further attempt.
    pub initial_backoff: Duration,
    /// Upper bound on one delivery attempt.
    pub timeout: Duration,
}

impl From<&NotifyConfig> for RelayConfig {
    fn from(config: &NotifyConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity,
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::from(&NotifyConfig::default())
    }
}

/// Cloneable sender side of the relay.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<CrisisNotification>,
}

impl RelayHandle {
    /// Reserve a slot in the queue without waiting.
    ///
    /// `None` means a notification sent now would be lost: the queue is full
    /// or the worker has stopped.
    pub fn reserve(&self) -> Option<NotificationPermit<'_>> {
        match self.tx.try_reserve() {
            Ok(permit) => Some(NotificationPermit { permit }),
            Err(mpsc::error::TrySendError::Full(())) => {
                warn!("notification queue full, dropping notification");
                lifeline_prometheus::record_notification("dropped");
                None
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                warn!("notification relay stopped, dropping notification");
                lifeline_prometheus::record_notification("dropped");
                None
            }
        }
    }

    /// Enqueue a notification without waiting.
    ///
    /// Returns `false` when the notification was dropped.
    pub fn dispatch(&self, notification: CrisisNotification) -> bool {
        match self.reserve() {
            Some(permit) => {
                permit.send(notification);
                true
            }
            None => false,
        }
    }
}

/// A reserved queue slot. Sending through it cannot fail; dropping it
/// releases the slot.
pub struct NotificationPermit<'a> {
    permit: mpsc::Permit<'a, CrisisNotification>,
}

impl NotificationPermit<'_> {
    pub fn send(self, notification: CrisisNotification) {
        debug!(event_id = %notification.event_id, "notification queued");
        self.permit.send(notification);
    }
}

/// Worker task that owns notification delivery.
pub struct NotificationRelay {
    worker: JoinHandle<()>,
}

impl NotificationRelay {
    /// Start the worker and return the handle the router dispatches through.
    ///
    /// The worker runs until `shutdown` is cancelled (or every handle is
    /// dropped), then delivers whatever is still queued and exits.
    pub fn spawn(
        notifier: Arc<dyn NotificationAdapter>,
        config: RelayConfig,
        shutdown: CancellationToken,
    ) -> (RelayHandle, NotificationRelay) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let worker = tokio::spawn(run_worker(notifier, config, rx, shutdown));
        (RelayHandle { tx }, NotificationRelay { worker })
    }

    /// Wait for the worker to finish draining.
    pub async fn join(self) -> Result<(), LifelineError> {
        self.worker
            .await
            .map_err(|e| LifelineError::Internal(format!("notification relay task failed: {e}")))
    }
}

async fn run_worker(
    notifier: Arc<dyn NotificationAdapter>,
    config: RelayConfig,
    mut rx: mpsc::Receiver<CrisisNotification>,
    shutdown: CancellationToken,
) {
    info!(notifier = notifier.name(), "notification relay started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = rx.recv() => match next {
                Some(notification) => deliver_with_retry(notifier.as_ref(), &config, &notification).await,
                None => {
                    debug!("all relay handles dropped");
                    break;
                }
            },
        }
    }

    // Stop accepting new work, then deliver what is already queued.
    rx.close();
    let mut drained = 0usize;
    while let Some(notification) = rx.recv().await {
        deliver_with_retry(notifier.as_ref(), &config, &notification).await;
        drained += 1;
    }

    info!(drained, "notification relay stopped");
}

async fn deliver_with_retry(
    notifier: &dyn NotificationAdapter,
    config: &RelayConfig,
    notification: &CrisisNotification,
) {
    let attempts = config.max_attempts.max(1);
    let mut backoff = config.initial_backoff;

    for attempt in 1..=attempts {
        if attempt > 1 {
            tokio::time::sleep(backoff).await;
            backoff = backoff.saturating_mul(2);
        }

        let result = match tokio::time::timeout(config.timeout, notifier.deliver(notification)).await
        {
            Ok(result) => result,
            Err(_) => Err(LifelineError::Timeout {
                duration: config.timeout,
            }),
        };

        match result {
            Ok(()) => {
                debug!(
                    event_id = %notification.event_id,
                    attempt,
                    "notification delivered"
                );
                lifeline_prometheus::record_notification("delivered");
                return;
            }
            Err(e) if attempt < attempts => {
                warn!(
                    event_id = %notification.event_id,
                    attempt,
                    error = %e,
                    "notification delivery failed, will retry"
                );
            }
            Err(e) => {
                error!(
                    event_id = %notification.event_id,
                    attempts,
                    error = %e,
                    "notification delivery failed, giving up"
                );
                lifeline_prometheus::record_notification("failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use lifeline_core::{AdapterType, AuditEvent, AuditEventType, HealthStatus, PluginAdapter};
    use tokio::sync::Mutex;

    use super::*;

    /// Fails the first `fail_first` deliveries, then records the rest.
    #[derive(Default)]
    struct FlakyNotifier {
        fail_first: u32,
        calls: AtomicU32,
        delivered: Mutex<Vec<CrisisNotification>>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl PluginAdapter for FlakyNotifier {
        fn name(&self) -> &str {
            "flaky"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Notification
        }
        async fn health_check(&self) -> Result<HealthStatus, LifelineError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), LifelineError> {
            Ok(())
        }
    }

    #[async_trait]
    impl NotificationAdapter for FlakyNotifier {
        async fn deliver(&self, notification: &CrisisNotification) -> Result<(), LifelineError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.fail_first {
                return Err(LifelineError::Notification {
                    message: "unavailable".into(),
                    source: None,
                });
            }
            self.delivered.lock().await.push(notification.clone());
            Ok(())
        }
    }

    fn notification() -> CrisisNotification {
        let event = AuditEvent::new(AuditEventType::CrisisModeTriggered, None, None, true);
        CrisisNotification::from(&event)
    }

    fn fast_config() -> RelayConfig {
        RelayConfig {
            queue_capacity: 8,
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn delivers_dispatched_notification() {
        let notifier = Arc::new(FlakyNotifier::default());
        let shutdown = CancellationToken::new();
        let (handle, relay) =
            NotificationRelay::spawn(notifier.clone(), fast_config(), shutdown.clone());

        assert!(handle.dispatch(notification()));
        shutdown.cancel();
        relay.join().await.unwrap();

        assert_eq!(notifier.delivered.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let notifier = Arc::new(FlakyNotifier {
            fail_first: 2,
            ..Default::default()
        });
        let shutdown = CancellationToken::new();
        let (handle, relay) =
            NotificationRelay::spawn(notifier.clone(), fast_config(), shutdown.clone());

        handle.dispatch(notification());
        shutdown.cancel();
        relay.join().await.unwrap();

        assert_eq!(notifier.calls.load(Ordering::SeqCst), 3);
        assert_eq!(notifier.delivered.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let notifier = Arc::new(FlakyNotifier {
            fail_first: u32::MAX,
            ..Default::default()
        });
        let shutdown = CancellationToken::new();
        let (handle, relay) =
            NotificationRelay::spawn(notifier.clone(), fast_config(), shutdown.clone());

        handle.dispatch(notification());
        shutdown.cancel();
        relay.join().await.unwrap();

        assert_eq!(notifier.calls.load(Ordering::SeqCst), 3);
        assert!(notifier.delivered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn slow_delivery_times_out_and_retries() {
        let notifier = Arc::new(FlakyNotifier {
            delay: Some(Duration::from_millis(100)),
            ..Default::default()
        });
        let config = RelayConfig {
            max_attempts: 2,
            timeout: Duration::from_millis(10),
            ..fast_config()
        };
        let shutdown = CancellationToken::new();
        let (handle, relay) = NotificationRelay::spawn(notifier.clone(), config, shutdown.clone());

        handle.dispatch(notification());
        shutdown.cancel();
        relay.join().await.unwrap();

        // Both attempts were cut off before recording.
        assert!(notifier.delivered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let notifier = Arc::new(FlakyNotifier {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let config = RelayConfig {
            queue_capacity: 1,
            ..fast_config()
        };
        let shutdown = CancellationToken::new();
        let (handle, relay) = NotificationRelay::spawn(notifier.clone(), config, shutdown.clone());

        let accepted = (0..20).filter(|_| handle.dispatch(notification())).count();
        assert!(accepted < 20, "a queue of one cannot accept 20 at once");
        assert!(accepted >= 1);

        shutdown.cancel();
        relay.join().await.unwrap();
        assert_eq!(notifier.delivered.lock().await.len(), accepted);
    }

    #[tokio::test]
    async fn shutdown_drains_queued_notifications() {
        let notifier = Arc::new(FlakyNotifier::default());
        let shutdown = CancellationToken::new();
        // Cancel before the worker has run: everything queued is still delivered.
        shutdown.cancel();
        let (handle, relay) =
            NotificationRelay::spawn(notifier.clone(), fast_config(), shutdown.clone());
        for _ in 0..5 {
            handle.dispatch(notification());
        }
        relay.join().await.unwrap();

        assert_eq!(notifier.delivered.lock().await.len(), 5);
    }

    #[tokio::test]
    async fn dispatch_after_stop_is_dropped() {
        let notifier = Arc::new(FlakyNotifier::default());
        let shutdown = CancellationToken::new();
        let (handle, relay) = NotificationRelay::spawn(notifier, fast_config(), shutdown.clone());
        shutdown.cancel();
        relay.join().await.unwrap();

        assert!(!handle.dispatch(notification()));
    }

    #[tokio::test]
    async fn reserve_fails_once_relay_has_stopped() {
        let notifier = Arc::new(FlakyNotifier::default());
        let shutdown = CancellationToken::new();
        let (handle, relay) = NotificationRelay::spawn(notifier, fast_config(), shutdown.clone());
        assert!(handle.reserve().is_some());

        shutdown.cancel();
        relay.join().await.unwrap();
        assert!(handle.reserve().is_none());
    }

    #[tokio::test]
    async fn reserve_fails_on_full_queue_and_frees_slot_on_drop() {
        let notifier = Arc::new(FlakyNotifier::default());
        let shutdown = CancellationToken::new();
        let config = RelayConfig {
            queue_capacity: 1,
            ..fast_config()
        };
        let (handle, relay) = NotificationRelay::spawn(notifier.clone(), config, shutdown.clone());

        let permit = handle.reserve().unwrap();
        assert!(handle.reserve().is_none());
        drop(permit);

        let permit = handle.reserve().unwrap();
        permit.send(notification());
        shutdown.cancel();
        relay.join().await.unwrap();
        assert_eq!(notifier.delivered.lock().await.len(), 1);
    }

    #[test]
    fn config_conversion() {
        let config = RelayConfig::from(&NotifyConfig::default());
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.initial_backoff, Duration::from_millis(500));
    }
}
