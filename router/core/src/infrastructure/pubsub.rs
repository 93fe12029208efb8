// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Topic Pub/Sub - Broadcast side-channel for queue notifications
//
// Provides named-topic fan-out using one tokio broadcast channel per topic.
// Any number of observers can subscribe to a topic and react to events
// without polling the publisher.
//
// LocalPubSub fans out in-process only. A cluster transport implements the
// same PubSub trait and feeds remote events into local subscriptions.

use dashmap::DashMap;
use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

pub const DEFAULT_TOPIC_CAPACITY: usize = 1024;

/// Publish/subscribe over named topics
pub trait PubSub<E>: Send + Sync {
    /// Publish to every current subscriber of `topic`, returning how many were reached
    fn publish(&self, topic: &str, event: E) -> usize;

    fn subscribe(&self, topic: &str) -> TopicSubscription<E>;

    fn unsubscribe(&self, subscription: TopicSubscription<E>);

    fn subscriber_count(&self, topic: &str) -> usize;
}

/// In-process pub/sub
pub struct LocalPubSub<E> {
    topics: DashMap<String, broadcast::Sender<E>>,
    capacity: usize,
}

impl<E> LocalPubSub<E>
where
    E: Clone + Send + 'static,
{
    /// Capacity is the per-topic buffer; slow subscribers lag once it is exceeded
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_TOPIC_CAPACITY)
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl<E> Default for LocalPubSub<E>
where
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl<E> PubSub<E> for LocalPubSub<E>
where
    E: Clone + Send + Sync + 'static,
{
    fn publish(&self, topic: &str, event: E) -> usize {
        match self.topics.get(topic) {
            Some(sender) => {
                // send() only fails when every receiver is gone
                let reached = sender.send(event).unwrap_or(0);
                if reached == 0 {
                    debug!(topic, "No subscribers listening on topic");
                }
                reached
            }
            None => 0,
        }
    }

    fn subscribe(&self, topic: &str) -> TopicSubscription<E> {
        let receiver = self
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();
        debug!(topic, "New topic subscription");
        TopicSubscription {
            topic: topic.to_string(),
            receiver,
        }
    }

    fn unsubscribe(&self, subscription: TopicSubscription<E>) {
        let topic = subscription.topic.clone();
        drop(subscription);
        if self
            .topics
            .remove_if(&topic, |_, sender| sender.receiver_count() == 0)
            .is_some()
        {
            debug!(topic = %topic, "Removed topic with no remaining subscribers");
        }
    }

    fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

/// Receiver half of a topic subscription
pub struct TopicSubscription<E> {
    topic: String,
    receiver: broadcast::Receiver<E>,
}

impl<E> TopicSubscription<E>
where
    E: Clone + Send + 'static,
{
    /// Build a subscription from an existing broadcast receiver (transport adapters)
    pub fn from_receiver(topic: impl Into<String>, receiver: broadcast::Receiver<E>) -> Self {
        Self {
            topic: topic.into(),
            receiver,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<E, PubSubError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => PubSubError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!(topic = %self.topic, "Topic subscriber lagged by {} events", n);
                PubSubError::Lagged(n)
            }
        })
    }

    /// Try to receive an event without waiting
    pub fn try_recv(&mut self) -> Result<E, PubSubError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => PubSubError::Empty,
            broadcast::error::TryRecvError::Closed => PubSubError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!(topic = %self.topic, "Topic subscriber lagged by {} events", n);
                PubSubError::Lagged(n)
            }
        })
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<E, PubSubError>> {
        BroadcastStream::new(self.receiver).map(|item| {
            item.map_err(|BroadcastStreamRecvError::Lagged(n)| PubSubError::Lagged(n))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PubSubError {
    #[error("Topic is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Subscriber lagged by {0} events (events were dropped)")]
    Lagged(u64),
}
