// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Signal Router Application Service
//!
//! [`SignalRouter`] binds one subscription registry to a routing-domain name
//! and delegates every call to it; it adds no matching logic of its own.
//! [`RouterDirectory`] is the runtime-wide name service that resolves
//! "router for domain X" so independent domains (per tenant, per test) never
//! share subscriptions.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::node_config::RouterConfigManifest;
use crate::domain::pattern::{Pattern, PatternError};
use crate::domain::registry::{RegistryError, SubscriptionRegistry};
use crate::domain::signal::{ConsumerId, Signal};
use crate::infrastructure::subscription_registry::ShardedSubscriptionRegistry;
use crate::telemetry;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Unknown router: '{0}'")]
    UnknownRouter(String),

    #[error("Router already running: '{0}'")]
    AlreadyRunning(String),

    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Named façade over one subscription registry
pub struct SignalRouter {
    name: String,
    registry: Arc<dyn SubscriptionRegistry>,
}

impl SignalRouter {
    /// Router backed by a fresh sharded registry
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let registry = Arc::new(ShardedSubscriptionRegistry::new(name.clone()));
        Self { name, registry }
    }

    /// Router over a caller-supplied registry (alternate stores, test doubles)
    pub fn with_registry(name: impl Into<String>, registry: Arc<dyn SubscriptionRegistry>) -> Self {
        Self {
            name: name.into(),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &Arc<dyn SubscriptionRegistry> {
        &self.registry
    }

    pub fn register(&self, consumer: impl Into<ConsumerId>, pattern: Pattern) -> Result<(), RouterError> {
        self.registry.register(consumer.into(), pattern)?;
        Ok(())
    }

    /// Compile a raw field map and register it in one step
    pub fn register_fields(
        &self,
        consumer: impl Into<ConsumerId>,
        fields: &Map<String, Value>,
        priority: i32,
    ) -> Result<(), RouterError> {
        let pattern = Pattern::compile(fields, priority)?;
        self.register(consumer, pattern)
    }

    pub fn unregister(&self, consumer: &ConsumerId) -> Result<(), RouterError> {
        self.registry.unregister(consumer)?;
        Ok(())
    }

    pub fn route_signal(&self, signal: &Signal) -> Result<Vec<ConsumerId>, RouterError> {
        self.route_fields(&signal.fields())
    }

    /// Route an already-flattened field map
    pub fn route_fields(&self, fields: &Map<String, Value>) -> Result<Vec<ConsumerId>, RouterError> {
        let matched = self.registry.find_matching(fields)?;
        metrics::counter!(telemetry::SIGNALS_ROUTED, "router" => self.name.clone()).increment(1);
        metrics::counter!(telemetry::SIGNAL_MATCHES, "router" => self.name.clone())
            .increment(matched.len() as u64);
        debug!(router = %self.name, matches = matched.len(), "Routed signal");
        Ok(matched)
    }

    /// Matches with priorities, highest first
    pub fn route_ranked(&self, signal: &Signal) -> Result<Vec<(ConsumerId, i32)>, RouterError> {
        Ok(self.registry.find_matching_ranked(&signal.fields())?)
    }

    pub fn consumers(&self) -> Result<Vec<ConsumerId>, RouterError> {
        Ok(self.registry.consumers()?)
    }

    pub fn subscription_count(&self) -> Result<usize, RouterError> {
        Ok(self.registry.len()?)
    }

    /// Tear down the backing registry; this handle errors from now on
    pub fn shutdown(&self) {
        self.registry.teardown();
    }
}

/// Runtime-wide name service for routers
#[derive(Default)]
pub struct RouterDirectory {
    routers: DashMap<String, Arc<SignalRouter>>,
}

impl RouterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory with every router named in the configuration started
    pub fn from_config(config: &RouterConfigManifest) -> Result<Self, RouterError> {
        let directory = Self::new();
        for name in &config.spec.routers {
            directory.start(name.clone())?;
        }
        Ok(directory)
    }

    /// Start a router with a fresh sharded registry
    pub fn start(&self, name: impl Into<String>) -> Result<Arc<SignalRouter>, RouterError> {
        let name = name.into();
        self.insert(Arc::new(SignalRouter::new(name)))
    }

    /// Install a pre-built router under its own name
    pub fn insert(&self, router: Arc<SignalRouter>) -> Result<Arc<SignalRouter>, RouterError> {
        match self.routers.entry(router.name().to_string()) {
            Entry::Occupied(entry) => Err(RouterError::AlreadyRunning(entry.key().clone())),
            Entry::Vacant(entry) => {
                info!(router = %router.name(), "Router started");
                entry.insert(Arc::clone(&router));
                Ok(router)
            }
        }
    }

    /// Stop a router and tear its registry down
    pub fn stop(&self, name: &str) -> Result<(), RouterError> {
        let (_, router) = self
            .routers
            .remove(name)
            .ok_or_else(|| RouterError::UnknownRouter(name.to_string()))?;
        router.shutdown();
        info!(router = %name, "Router stopped");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<SignalRouter>, RouterError> {
        self.routers
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RouterError::UnknownRouter(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routers.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn register(
        &self,
        router_name: &str,
        consumer: impl Into<ConsumerId>,
        pattern: Pattern,
    ) -> Result<(), RouterError> {
        self.get(router_name)?.register(consumer, pattern)
    }

    pub fn unregister(&self, router_name: &str, consumer: &ConsumerId) -> Result<(), RouterError> {
        self.get(router_name)?.unregister(consumer)
    }

    pub fn route_signal(&self, router_name: &str, signal: &Signal) -> Result<Vec<ConsumerId>, RouterError> {
        self.get(router_name)?.route_signal(signal)
    }
}
