// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Delivery Dispatcher Application Service
//!
//! Hands a routed `(signal, consumer)` pair to the pluggable
//! [`DeliveryHandler`] on a spawned task so routing latency never depends
//! on how slow or broken a consumer is.
//!
//! Delivery is best-effort and at-most-once:
//! - success is logged at debug level
//! - failures and timeouts are logged as warnings and dropped
//! - nothing is retried and nothing propagates back to the producer

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::delivery::{DeliveryError, DeliveryHandler};
use crate::domain::node_config::DeliveryConfig;
use crate::domain::signal::{ConsumerId, Signal};
use crate::telemetry;

pub struct DeliveryDispatcher {
    handler: Arc<dyn DeliveryHandler>,
    timeout: Duration,
}

impl DeliveryDispatcher {
    pub fn new(handler: Arc<dyn DeliveryHandler>, timeout: Duration) -> Self {
        Self { handler, timeout }
    }

    pub fn from_config(handler: Arc<dyn DeliveryHandler>, config: &DeliveryConfig) -> Self {
        Self::new(handler, Duration::from_millis(config.timeout_ms))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fire-and-forget delivery to one consumer.
    ///
    /// The returned handle only exists so callers (tests, shutdown paths) can
    /// wait for the attempt; dropping it does not cancel the delivery.
    pub fn deliver(&self, signal: Signal, consumer: ConsumerId) -> JoinHandle<()> {
        self.spawn_delivery(Arc::new(signal), consumer)
    }

    /// One delivery task per consumer, all sharing the same signal
    pub fn deliver_all(
        &self,
        signal: Signal,
        consumers: impl IntoIterator<Item = ConsumerId>,
    ) -> Vec<JoinHandle<()>> {
        let signal = Arc::new(signal);
        consumers
            .into_iter()
            .map(|consumer| self.spawn_delivery(Arc::clone(&signal), consumer))
            .collect()
    }

    /// Awaited delivery under the same timeout, for callers that need the outcome.
    /// Nothing is logged or counted here.
    pub async fn attempt(&self, signal: &Signal, consumer: &ConsumerId) -> Result<(), DeliveryError> {
        timed_delivery(self.handler.as_ref(), signal, consumer, self.timeout).await
    }

    fn spawn_delivery(&self, signal: Arc<Signal>, consumer: ConsumerId) -> JoinHandle<()> {
        let handler = Arc::clone(&self.handler);
        let timeout = self.timeout;

        tokio::spawn(async move {
            match timed_delivery(handler.as_ref(), &signal, &consumer, timeout).await {
                Ok(()) => {
                    metrics::counter!(telemetry::DELIVERIES, "outcome" => "ok").increment(1);
                    debug!(
                        signal_id = %signal.id,
                        schema_id = %signal.schema_id,
                        consumer = %consumer,
                        "Signal delivered"
                    );
                }
                Err(e) => {
                    metrics::counter!(telemetry::DELIVERIES, "outcome" => "failed").increment(1);
                    warn!(
                        signal_id = %signal.id,
                        schema_id = %signal.schema_id,
                        consumer = %consumer,
                        error = %e,
                        "Signal delivery failed, dropping"
                    );
                }
            }
        })
    }
}

async fn timed_delivery(
    handler: &dyn DeliveryHandler,
    signal: &Signal,
    consumer: &ConsumerId,
    timeout: Duration,
) -> Result<(), DeliveryError> {
    match tokio::time::timeout(timeout, handler.deliver(signal, consumer)).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Timeout(timeout.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingHandler {
        delivered: Mutex<Vec<(String, ConsumerId)>>,
    }

    #[async_trait]
    impl DeliveryHandler for RecordingHandler {
        async fn deliver(&self, signal: &Signal, consumer: &ConsumerId) -> Result<(), DeliveryError> {
            self.delivered
                .lock()
                .push((signal.schema_id.clone(), consumer.clone()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FailingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DeliveryHandler for FailingHandler {
        async fn deliver(&self, _signal: &Signal, consumer: &ConsumerId) -> Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DeliveryError::Unreachable(consumer.to_string()))
        }
    }

    /// Sleeps far past any test timeout and records whether it ever finished
    #[derive(Default)]
    struct StalledHandler {
        started: AtomicBool,
        finished: AtomicBool,
    }

    #[async_trait]
    impl DeliveryHandler for StalledHandler {
        async fn deliver(&self, _signal: &Signal, _consumer: &ConsumerId) -> Result<(), DeliveryError> {
            self.started.store(true, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deliver_invokes_handler() {
        let handler = Arc::new(RecordingHandler::default());
        let dispatcher = DeliveryDispatcher::new(handler.clone(), Duration::from_secs(1));

        dispatcher
            .deliver(Signal::new("task.created", json!({})), "worker".into())
            .await
            .unwrap();

        let delivered = handler.delivered.lock();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0], ("task.created".to_string(), ConsumerId::from("worker")));
    }

    #[tokio::test]
    async fn test_deliver_all_fans_out() {
        let handler = Arc::new(RecordingHandler::default());
        let dispatcher = DeliveryDispatcher::new(handler.clone(), Duration::from_secs(1));

        let handles = dispatcher.deliver_all(
            Signal::new("task.created", json!({})),
            vec!["a".into(), "b".into(), "c".into()],
        );
        for handle in handles {
            handle.await.unwrap();
        }

        let mut consumers: Vec<String> = handler
            .delivered
            .lock()
            .iter()
            .map(|(_, c)| c.to_string())
            .collect();
        consumers.sort();
        assert_eq!(consumers, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_attempt_surfaces_handler_error() {
        let handler = Arc::new(FailingHandler::default());
        let dispatcher = DeliveryDispatcher::new(handler.clone(), Duration::from_secs(1));

        let outcome = dispatcher
            .attempt(&Signal::new("x", json!({})), &"gone".into())
            .await;
        assert!(matches!(outcome, Err(DeliveryError::Unreachable(ref id)) if id == "gone"));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let handler = Arc::new(FailingHandler::default());
        let dispatcher = DeliveryDispatcher::new(handler.clone(), Duration::from_secs(1));

        let handle = dispatcher.deliver(Signal::new("x", json!({})), "gone".into());
        // The handler ran and failed, yet the task itself completes normally
        assert!(handle.await.is_ok());
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_handler_times_out() {
        let handler = Arc::new(StalledHandler::default());
        let dispatcher = DeliveryDispatcher::new(handler.clone(), Duration::from_millis(50));

        let started_at = tokio::time::Instant::now();
        let outcome = dispatcher
            .attempt(&Signal::new("x", json!({})), &"slow".into())
            .await;

        assert!(matches!(outcome, Err(DeliveryError::Timeout(50))));
        assert!(started_at.elapsed() < Duration::from_secs(60));
        assert!(handler.started.load(Ordering::SeqCst));
        assert!(!handler.finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_delivery_is_cancelled_on_timeout() {
        let handler = Arc::new(StalledHandler::default());
        let dispatcher = DeliveryDispatcher::new(handler.clone(), Duration::from_millis(50));

        let handle = dispatcher.deliver(Signal::new("x", json!({})), "slow".into());
        assert!(handle.await.is_ok());

        // Let the clock run past the handler's own sleep; the dropped future never resumes
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(handler.started.load(Ordering::SeqCst));
        assert!(!handler.finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_from_config() {
        let config = DeliveryConfig { timeout_ms: 250 };
        let dispatcher = DeliveryDispatcher::from_config(Arc::new(FailingHandler::default()), &config);
        assert_eq!(dispatcher.timeout(), Duration::from_millis(250));
    }
}
