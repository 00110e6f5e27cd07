// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock outbound transport for deterministic testing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use cadence_core::traits::transport::MessageSender;
use cadence_core::types::CounterpartId;
use cadence_core::CadenceError;

/// A recording transport that can be switched into a failing state.
pub struct MockSender {
    sent: Mutex<Vec<(CounterpartId, String)>>,
    failing: AtomicBool,
}

impl MockSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        })
    }

    /// When `failing` is true every send returns a delivery error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything delivered so far, in order.
    pub async fn sent(&self) -> Vec<(CounterpartId, String)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl MessageSender for MockSender {
    async fn send(&self, counterpart_id: &CounterpartId, text: &str) -> Result<(), CadenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CadenceError::Delivery {
                message: "mock transport failure".to_string(),
                source: None,
            });
        }
        self.sent
            .lock()
            .await
            .push((counterpart_id.clone(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sends_in_order() {
        let sender = MockSender::new();
        sender.send(&CounterpartId("a".into()), "one").await.unwrap();
        sender.send(&CounterpartId("b".into()), "two").await.unwrap();

        let sent = sender.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1, "one");
        assert_eq!(sent[1].1, "two");
    }

    #[tokio::test]
    async fn failing_mode_returns_delivery_error() {
        let sender = MockSender::new();
        sender.set_failing(true);
        let err = sender
            .send(&CounterpartId("a".into()), "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, CadenceError::Delivery { .. }));
        assert_eq!(sender.sent_count().await, 0);
    }
}
