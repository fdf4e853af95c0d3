// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification adapter that records what it was asked to deliver.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use lifeline_core::{AdapterType, CrisisNotification, LifelineError, NotificationAdapter};

/// Captures delivered notifications, or fails every delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<CrisisNotification>>,
    attempts: AtomicUsize,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Notifications delivered so far.
    pub async fn delivered(&self) -> Vec<CrisisNotification> {
        self.delivered.lock().await.clone()
    }

    /// Delivery attempts so far, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

crate::mock_plugin!(RecordingNotifier, "recording", AdapterType::Notification);

#[async_trait]
impl NotificationAdapter for RecordingNotifier {
    async fn deliver(&self, notification: &CrisisNotification) -> Result<(), LifelineError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LifelineError::Notification {
                message: "mock notifier failure".into(),
                source: None,
            });
        }
        self.delivered.lock().await.push(notification.clone());
        Ok(())
    }
}
