// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Concurrent ordered-table queue.
//!
//! Entries live in a shared `BTreeMap` ordered by [`EntryKey`]. There is no
//! owning task: producers and consumers touch the table directly, readers
//! (`len`, `to_list`) share the lock and only insert/take serialize briefly.
//!
//! Keys pair a monotonic nanosecond reading with a process-wide sequence
//! number, so two pushes that read the same clock value still get distinct
//! keys and neither overwrites the other.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::queue::{QueueError, SignalQueue};
use crate::domain::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    /// Nanoseconds since the queue was created
    pub enqueued_at_ns: u64,
    /// Disambiguates equal clock readings
    pub sequence: u64,
}

pub struct OrderedTableQueue<T = Signal> {
    name: String,
    table: RwLock<BTreeMap<EntryKey, T>>,
    epoch: Instant,
    sequence: AtomicU64,
    closed: AtomicBool,
}

impl<T> OrderedTableQueue<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: RwLock::new(BTreeMap::new()),
            epoch: Instant::now(),
            sequence: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn next_key(&self) -> EntryKey {
        let enqueued_at_ns = u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
        EntryKey {
            enqueued_at_ns,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn ensure_open(&self) -> Result<(), QueueError> {
        if self.closed.load(Ordering::Acquire) {
            Err(QueueError::Closed)
        } else {
            Ok(())
        }
    }

    /// Key of the current head, if any
    pub fn peek_key(&self) -> Option<EntryKey> {
        self.table.read().keys().next().copied()
    }
}

#[async_trait]
impl<T> SignalQueue<T> for OrderedTableQueue<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn push(&self, item: T) -> Result<(), QueueError> {
        self.ensure_open()?;
        let key = self.next_key();
        let mut table = self.table.write();
        // Re-check under the lock so a push racing cleanup cannot land afterwards
        self.ensure_open()?;
        table.insert(key, item);
        Ok(())
    }

    async fn pop(&self) -> Result<Option<T>, QueueError> {
        self.ensure_open()?;
        let popped = self.table.write().pop_first();
        if let Some((key, _)) = &popped {
            debug!(queue = %self.name, sequence = key.sequence, "Popped entry");
        }
        Ok(popped.map(|(_, item)| item))
    }

    async fn len(&self) -> Result<usize, QueueError> {
        self.ensure_open()?;
        Ok(self.table.read().len())
    }

    async fn cleanup(&self) -> Result<(), QueueError> {
        let mut table = self.table.write();
        if !self.closed.swap(true, Ordering::AcqRel) {
            let dropped = table.len();
            table.clear();
            info!(queue = %self.name, dropped, "Queue cleaned up");
        }
        Ok(())
    }

    async fn to_list(&self) -> Result<Vec<T>, QueueError> {
        self.ensure_open()?;
        Ok(self.table.read().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = OrderedTableQueue::new("fifo");
        for i in 1..=3 {
            queue.push(i).await.unwrap();
        }
        assert_eq!(queue.pop().await.unwrap(), Some(1));
        assert_eq!(queue.pop().await.unwrap(), Some(2));
        assert_eq!(queue.pop().await.unwrap(), Some(3));
        assert_eq!(queue.pop().await.unwrap(), None);
    }

    #[test]
    fn test_keys_are_strictly_increasing() {
        let queue: OrderedTableQueue<u32> = OrderedTableQueue::new("keys");
        let keys: Vec<EntryKey> = (0..1000).map(|_| queue.next_key()).collect();
        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pushes_are_never_lost() {
        let queue = Arc::new(OrderedTableQueue::new("concurrent"));
        let mut handles = Vec::new();
        for producer in 0..8u32 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                for i in 0..250u32 {
                    queue.push(producer * 1000 + i).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(queue.len().await.unwrap(), 2000);

        // Each producer's items come out in the order that producer pushed them
        let items = queue.to_list().await.unwrap();
        for producer in 0..8u32 {
            let own: Vec<u32> = items
                .iter()
                .copied()
                .filter(|item| item / 1000 == producer)
                .collect();
            assert_eq!(own.len(), 250);
            assert!(own.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent_and_closes() {
        let queue = OrderedTableQueue::new("cleanup");
        queue.push(1).await.unwrap();
        assert!(queue.cleanup().await.is_ok());
        assert!(queue.cleanup().await.is_ok());
        assert_eq!(queue.pop().await.unwrap_err(), QueueError::Closed);
        assert_eq!(queue.push(2).await.unwrap_err(), QueueError::Closed);
    }
}
