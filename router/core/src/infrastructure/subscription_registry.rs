// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Sharded Subscription Registry
//
// Consumer -> pattern store backed by a DashMap. Reads and writes lock a
// single shard, so register/unregister never stall a find_matching running
// against other shards. Matching is a full scan, O(registrations) per signal.
//
// A scan that overlaps a concurrent register/unregister of the same consumer
// may observe either the old or new state for that consumer.

use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::pattern::Pattern;
use crate::domain::registry::{RegistryError, SubscriptionRegistry};
use crate::domain::signal::ConsumerId;

pub struct ShardedSubscriptionRegistry {
    name: String,
    subscriptions: DashMap<ConsumerId, Arc<Pattern>>,
    torn_down: AtomicBool,
}

impl ShardedSubscriptionRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscriptions: DashMap::new(),
            torn_down: AtomicBool::new(false),
        }
    }

    fn ensure_live(&self) -> Result<(), RegistryError> {
        if self.torn_down.load(Ordering::Acquire) {
            Err(RegistryError::UnknownRegistry(self.name.clone()))
        } else {
            Ok(())
        }
    }
}

impl SubscriptionRegistry for ShardedSubscriptionRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&self, consumer: ConsumerId, pattern: Pattern) -> Result<(), RegistryError> {
        self.ensure_live()?;
        debug!(
            registry = %self.name,
            consumer = %consumer,
            fields = pattern.field_count(),
            priority = pattern.priority(),
            "Registering subscription"
        );
        let replaced = self
            .subscriptions
            .insert(consumer.clone(), Arc::new(pattern))
            .is_some();

        // A teardown that raced this insert has already cleared the map
        if self.torn_down.load(Ordering::Acquire) {
            self.subscriptions.remove(&consumer);
            return Err(RegistryError::UnknownRegistry(self.name.clone()));
        }

        if replaced {
            debug!(registry = %self.name, consumer = %consumer, "Replaced existing subscription");
        }
        Ok(())
    }

    fn unregister(&self, consumer: &ConsumerId) -> Result<(), RegistryError> {
        self.ensure_live()?;
        if self.subscriptions.remove(consumer).is_some() {
            debug!(registry = %self.name, consumer = %consumer, "Unregistered subscription");
        }
        Ok(())
    }

    fn find_matching(&self, signal: &Map<String, Value>) -> Result<Vec<ConsumerId>, RegistryError> {
        self.ensure_live()?;
        Ok(self
            .subscriptions
            .iter()
            .filter(|entry| entry.value().matches(signal).is_some())
            .map(|entry| entry.key().clone())
            .collect())
    }

    fn find_matching_ranked(
        &self,
        signal: &Map<String, Value>,
    ) -> Result<Vec<(ConsumerId, i32)>, RegistryError> {
        self.ensure_live()?;
        let mut ranked: Vec<(ConsumerId, i32)> = self
            .subscriptions
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .matches(signal)
                    .map(|priority| (entry.key().clone(), priority))
            })
            .collect();
        ranked.sort_by(|(a_id, a_pri), (b_id, b_pri)| b_pri.cmp(a_pri).then_with(|| a_id.cmp(b_id)));
        Ok(ranked)
    }

    fn pattern_of(&self, consumer: &ConsumerId) -> Result<Option<Arc<Pattern>>, RegistryError> {
        self.ensure_live()?;
        Ok(self
            .subscriptions
            .get(consumer)
            .map(|entry| Arc::clone(entry.value())))
    }

    fn consumers(&self) -> Result<Vec<ConsumerId>, RegistryError> {
        self.ensure_live()?;
        Ok(self
            .subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect())
    }

    fn len(&self) -> Result<usize, RegistryError> {
        self.ensure_live()?;
        Ok(self.subscriptions.len())
    }

    fn teardown(&self) {
        if !self.torn_down.swap(true, Ordering::AcqRel) {
            let dropped = self.subscriptions.len();
            self.subscriptions.clear();
            info!(registry = %self.name, dropped, "Subscription registry torn down");
        }
    }
}
