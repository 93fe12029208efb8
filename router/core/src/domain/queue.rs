// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Signal Queue Contract
//!
//! One FIFO contract, three interchangeable backends in
//! `crate::infrastructure::queue`:
//!
//! | Backend | Ordering source | Capacity |
//! |---------|-----------------|----------|
//! | `InMemoryQueue` | single owning task | unbounded |
//! | `OrderedTableQueue` | strictly increasing sequence keys | unbounded |
//! | `DistributedQueue` | single owning task | bounded, with `queue:<name>` notifications |
//!
//! `pop` on an empty queue returns `Ok(None)` immediately. `cleanup` releases
//! every queued entry and is idempotent; any other operation after cleanup
//! reports [`QueueError::Closed`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::signal::Signal;

/// Default capacity ceiling for bounded queues
pub const DEFAULT_MAX_SIZE: usize = 10_000;

#[async_trait]
pub trait SignalQueue<T = Signal>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    /// Append an item at the tail
    async fn push(&self, item: T) -> Result<(), QueueError>;

    /// Remove and return the head, `None` when empty
    async fn pop(&self) -> Result<Option<T>, QueueError>;

    async fn len(&self) -> Result<usize, QueueError>;

    async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }

    /// Drop all entries and release the backing resources
    async fn cleanup(&self) -> Result<(), QueueError>;

    /// Non-destructive snapshot in FIFO order
    async fn to_list(&self) -> Result<Vec<T>, QueueError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Queue is full (capacity {capacity})")]
    Full { capacity: usize },

    #[error("Queue has been cleaned up")]
    Closed,
}

/// Notification published on a distributed queue's broadcast topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "item", rename_all = "snake_case")]
pub enum QueueEvent<T> {
    Pushed(T),
    Popped(T),
}

impl<T> QueueEvent<T> {
    pub fn item(&self) -> &T {
        match self {
            QueueEvent::Pushed(item) | QueueEvent::Popped(item) => item,
        }
    }
}

/// Broadcast topic for a named distributed queue
pub fn queue_topic(queue_name: &str) -> String {
    format!("queue:{}", queue_name)
}
