// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Queue backends implementing [`crate::domain::queue::SignalQueue`].

pub mod in_memory;
pub mod ordered_table;
pub mod distributed;

pub use distributed::DistributedQueue;
pub use in_memory::InMemoryQueue;
pub use ordered_table::OrderedTableQueue;

use std::sync::Arc;
use tracing::info;

use crate::domain::node_config::{QueueBackend, QueueConfig};
use crate::domain::queue::{QueueEvent, SignalQueue};
use crate::domain::signal::Signal;
use crate::infrastructure::pubsub::PubSub;

/// Build the configured queue backend.
///
/// `pubsub` carries notifications for the distributed backend and is ignored
/// by the others. Must be called from within a tokio runtime.
pub fn build_queue(
    config: &QueueConfig,
    pubsub: Arc<dyn PubSub<QueueEvent<Signal>>>,
) -> Arc<dyn SignalQueue<Signal>> {
    info!(queue = %config.name, backend = ?config.backend, "Building signal queue");
    match config.backend {
        QueueBackend::InMemory => Arc::new(InMemoryQueue::<Signal>::spawn(config.name.clone())),
        QueueBackend::OrderedTable => Arc::new(OrderedTableQueue::<Signal>::new(config.name.clone())),
        QueueBackend::Distributed => Arc::new(DistributedQueue::<Signal>::spawn(
            config.name.clone(),
            config.max_size,
            pubsub,
        )),
    }
}
