// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Bounded Distributed Queue
//
// Single-owner queue (same actor as InMemoryQueue) with a capacity ceiling
// and a broadcast side-channel. Every successful push/pop is announced as a
// QueueEvent on the topic "queue:<name>", in the order the owning task
// applied them. Observers subscribe to that topic instead of polling.
//
// A push against a full queue returns QueueError::Full. This is the only
// backpressure signal and the queue never retries on the caller's behalf.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::domain::queue::{queue_topic, QueueError, QueueEvent, SignalQueue};
pub use crate::domain::queue::DEFAULT_MAX_SIZE;
use crate::domain::signal::Signal;
use crate::infrastructure::pubsub::{LocalPubSub, PubSub, TopicSubscription};

use super::in_memory::{ActorHandle, Notifier};

pub struct DistributedQueue<T = Signal> {
    name: String,
    topic: String,
    max_size: usize,
    pubsub: Arc<dyn PubSub<QueueEvent<T>>>,
    actor: ActorHandle<T>,
}

impl<T> Clone for DistributedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            topic: self.topic.clone(),
            max_size: self.max_size,
            pubsub: Arc::clone(&self.pubsub),
            actor: self.actor.clone(),
        }
    }
}

impl<T> DistributedQueue<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start the owning task. Must be called from within a tokio runtime.
    pub fn spawn(
        name: impl Into<String>,
        max_size: usize,
        pubsub: Arc<dyn PubSub<QueueEvent<T>>>,
    ) -> Self {
        let name = name.into();
        let topic = queue_topic(&name);
        let actor = ActorHandle::spawn(
            &name,
            Some(max_size),
            Some(Notifier {
                pubsub: Arc::clone(&pubsub),
                topic: topic.clone(),
            }),
        );
        info!(queue = %name, topic = %topic, max_size, "Distributed queue started");
        Self {
            name,
            topic,
            max_size,
            pubsub,
            actor,
        }
    }

    /// Default capacity, in-process notifications
    pub fn with_local_pubsub(name: impl Into<String>) -> Self {
        Self::spawn(
            name,
            DEFAULT_MAX_SIZE,
            Arc::new(LocalPubSub::<QueueEvent<T>>::with_default_capacity()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Broadcast topic carrying this queue's push/pop events
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn subscribe(&self) -> TopicSubscription<QueueEvent<T>> {
        self.pubsub.subscribe(&self.topic)
    }

    pub fn unsubscribe(&self, subscription: TopicSubscription<QueueEvent<T>>) {
        self.pubsub.unsubscribe(subscription);
    }

    pub fn subscriber_count(&self) -> usize {
        self.pubsub.subscriber_count(&self.topic)
    }
}

#[async_trait]
impl<T> SignalQueue<T> for DistributedQueue<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn push(&self, item: T) -> Result<(), QueueError> {
        self.actor.push(item).await
    }

    async fn pop(&self) -> Result<Option<T>, QueueError> {
        self.actor.pop().await
    }

    async fn len(&self) -> Result<usize, QueueError> {
        self.actor.len().await
    }

    async fn cleanup(&self) -> Result<(), QueueError> {
        self.actor.cleanup().await
    }

    async fn to_list(&self) -> Result<Vec<T>, QueueError> {
        self.actor.to_list().await
    }
}
