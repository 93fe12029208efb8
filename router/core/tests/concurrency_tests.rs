// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde_json::{json, Map, Value};
use specter_core::application::router::SignalRouter;
use specter_core::domain::pattern::Pattern;
use specter_core::domain::signal::ConsumerId;
use std::sync::Arc;
use std::time::{Duration, Instant};

const REGISTRANTS: usize = 10;
const PATTERNS_PER_REGISTRANT: usize = 100;
const QUERY_LOOPS: usize = 5;
const QUERIES_PER_LOOP: usize = 200;
const QUERY_BUDGET: Duration = Duration::from_millis(10);

fn single_field(key: String, value: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key, json!(value));
    map
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_and_queries() {
    let router = Arc::new(SignalRouter::new("load"));
    let mut registrants = Vec::new();

    for r in 0..REGISTRANTS {
        let router = Arc::clone(&router);
        registrants.push(tokio::spawn(async move {
            for p in 0..PATTERNS_PER_REGISTRANT {
                let fields = single_field(format!("field_{r}_{p}"), "value");
                let pattern = Pattern::compile(&fields, 0).unwrap();
                router.register(format!("specter-{r}-{p}"), pattern).unwrap();
                if p % 10 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }

    let mut queriers = Vec::new();
    for q in 0..QUERY_LOOPS {
        let router = Arc::clone(&router);
        queriers.push(tokio::spawn(async move {
            let mut worst = Duration::ZERO;
            for i in 0..QUERIES_PER_LOOP {
                let r = (q + i) % REGISTRANTS;
                let p = i % PATTERNS_PER_REGISTRANT;
                let signal = single_field(format!("field_{r}_{p}"), "value");

                let started = Instant::now();
                let matched = router.route_fields(&signal).unwrap();
                worst = worst.max(started.elapsed());

                // Either not registered yet or exactly the one owner
                assert!(matched.len() <= 1);
                if let Some(id) = matched.first() {
                    assert_eq!(id, &ConsumerId::from(format!("specter-{r}-{p}")));
                }
                tokio::task::yield_now().await;
            }
            worst
        }));
    }

    for handle in registrants {
        handle.await.unwrap();
    }
    for handle in queriers {
        let worst = handle.await.unwrap();
        assert!(
            worst < QUERY_BUDGET,
            "slowest find_matching took {:?}, budget {:?}",
            worst,
            QUERY_BUDGET
        );
    }

    // No registration lost once everything settles
    assert_eq!(
        router.subscription_count().unwrap(),
        REGISTRANTS * PATTERNS_PER_REGISTRANT
    );
    for r in 0..REGISTRANTS {
        for p in (0..PATTERNS_PER_REGISTRANT).step_by(17) {
            let matched = router
                .route_fields(&single_field(format!("field_{r}_{p}"), "value"))
                .unwrap();
            assert_eq!(matched, vec![ConsumerId::from(format!("specter-{r}-{p}"))]);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_register_unregister_same_consumer() {
    let router = Arc::new(SignalRouter::new("churn"));
    let signal = single_field("schema_id".to_string(), "task.created");

    let writer = {
        let router = Arc::clone(&router);
        tokio::spawn(async move {
            let id = ConsumerId::from("flapping");
            for _ in 0..500 {
                let pattern = Pattern::compile(&single_field("schema_id".to_string(), "task.*"), 0).unwrap();
                router.register(id.clone(), pattern).unwrap();
                router.unregister(&id).unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let reader = {
        let router = Arc::clone(&router);
        let signal = signal.clone();
        tokio::spawn(async move {
            for _ in 0..500 {
                let matched = router.route_fields(&signal).unwrap();
                assert!(matched.len() <= 1);
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();

    // Final state is the last write: unregistered
    assert!(router.route_fields(&signal).unwrap().is_empty());
}
