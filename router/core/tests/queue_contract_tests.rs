// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde_json::json;
use specter_core::domain::queue::{QueueError, QueueEvent, SignalQueue};
use specter_core::domain::signal::Signal;
use specter_core::infrastructure::pubsub::LocalPubSub;
use specter_core::infrastructure::queue::{DistributedQueue, InMemoryQueue, OrderedTableQueue};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn backends(name: &str) -> Vec<(&'static str, Arc<dyn SignalQueue<Signal>>)> {
    let in_memory: Arc<dyn SignalQueue<Signal>> = Arc::new(InMemoryQueue::<Signal>::spawn(name));
    let ordered: Arc<dyn SignalQueue<Signal>> = Arc::new(OrderedTableQueue::<Signal>::new(name));
    let distributed: Arc<dyn SignalQueue<Signal>> = Arc::new(DistributedQueue::<Signal>::spawn(
        name,
        100,
        Arc::new(LocalPubSub::<QueueEvent<Signal>>::with_default_capacity()),
    ));
    vec![
        ("in_memory", in_memory),
        ("ordered_table", ordered),
        ("distributed", distributed),
    ]
}

fn numbered(n: u32) -> Signal {
    Signal::new("task.created", json!({ "n": n }))
}

#[tokio::test]
async fn test_fifo_across_backends() {
    for (backend, queue) in backends("fifo") {
        let pushed: Vec<Signal> = (1..=3).map(numbered).collect();
        for signal in &pushed {
            assert_ok!(queue.push(signal.clone()).await);
        }

        assert_eq!(queue.len().await.unwrap(), 3, "{backend}");
        assert_eq!(queue.to_list().await.unwrap(), pushed, "{backend}");

        for expected in &pushed {
            assert_eq!(queue.pop().await.unwrap().as_ref(), Some(expected), "{backend}");
        }
        assert_eq!(queue.pop().await.unwrap(), None, "{backend}");
        assert!(queue.is_empty().await.unwrap(), "{backend}");
    }
}

#[tokio::test]
async fn test_cleanup_across_backends() {
    for (backend, queue) in backends("cleanup") {
        queue.push(numbered(1)).await.unwrap();
        assert_ok!(queue.cleanup().await);
        assert_ok!(queue.cleanup().await);
        assert_eq!(
            queue.push(numbered(2)).await.unwrap_err(),
            QueueError::Closed,
            "{backend}"
        );
    }
}

#[tokio::test]
async fn test_distributed_capacity_boundary() {
    let max_size = 25;
    let queue = DistributedQueue::spawn(
        "bounded",
        max_size,
        Arc::new(LocalPubSub::<QueueEvent<Signal>>::with_default_capacity()),
    );

    let pushed: Vec<Signal> = (0..max_size as u32).map(numbered).collect();
    for signal in &pushed {
        assert_ok!(queue.push(signal.clone()).await);
    }
    let overflow = assert_err!(queue.push(numbered(999)).await);
    assert_eq!(overflow, QueueError::Full { capacity: max_size });

    assert_eq!(queue.to_list().await.unwrap(), pushed);
}

#[tokio::test]
async fn test_distributed_observers_see_both_sides() {
    let queue = DistributedQueue::with_local_pubsub("observed");
    let mut first = queue.subscribe();
    let mut second = queue.subscribe();

    let signal = numbered(1);
    queue.push(signal.clone()).await.unwrap();
    queue.pop().await.unwrap();

    for observer in [&mut first, &mut second] {
        assert_eq!(observer.recv().await.unwrap(), QueueEvent::Pushed(signal.clone()));
        assert_eq!(observer.recv().await.unwrap(), QueueEvent::Popped(signal.clone()));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_consumers_ordered_table() {
    let queue = Arc::new(OrderedTableQueue::<u32>::new("mpmc"));
    let mut producers = Vec::new();
    for p in 0..4u32 {
        let queue = Arc::clone(&queue);
        producers.push(tokio::spawn(async move {
            for i in 0..500u32 {
                queue.push(p * 10_000 + i).await.unwrap();
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }

    let mut consumers = Vec::new();
    for _ in 0..4 {
        let queue = Arc::clone(&queue);
        consumers.push(tokio::spawn(async move {
            let mut taken = Vec::new();
            while let Some(item) = queue.pop().await.unwrap() {
                taken.push(item);
            }
            taken
        }));
    }

    let mut all = Vec::new();
    for consumer in consumers {
        all.extend(consumer.await.unwrap());
    }
    all.sort_unstable();
    all.dedup();
    // Every item taken exactly once
    assert_eq!(all.len(), 2000);
}
