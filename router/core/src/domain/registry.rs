// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Subscription Registry Interface
//!
//! Storage contract for consumer subscriptions, defined in the domain layer and
//! implemented in `crate::infrastructure::subscription_registry`.
//!
//! Each consumer holds exactly one pattern. Registering again replaces the
//! previous pattern (last write wins). Operations never block on I/O and are
//! safe to call from any number of concurrent tasks without external locking.
//! A registry that has been torn down rejects every call with
//! [`RegistryError::UnknownRegistry`] instead of answering empty.

use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::domain::pattern::Pattern;
use crate::domain::signal::ConsumerId;

pub trait SubscriptionRegistry: Send + Sync {
    /// Name of the routing domain this registry serves
    fn name(&self) -> &str;

    /// Store (or replace) the pattern for a consumer
    fn register(&self, consumer: ConsumerId, pattern: Pattern) -> Result<(), RegistryError>;

    /// Remove a consumer; absent consumers are not an error
    fn unregister(&self, consumer: &ConsumerId) -> Result<(), RegistryError>;

    /// All consumers whose pattern matches, de-duplicated, unordered
    fn find_matching(&self, signal: &Map<String, Value>) -> Result<Vec<ConsumerId>, RegistryError>;

    /// Matches with their priority, highest priority first (ties by consumer id)
    fn find_matching_ranked(
        &self,
        signal: &Map<String, Value>,
    ) -> Result<Vec<(ConsumerId, i32)>, RegistryError>;

    fn pattern_of(&self, consumer: &ConsumerId) -> Result<Option<Arc<Pattern>>, RegistryError>;

    fn consumers(&self) -> Result<Vec<ConsumerId>, RegistryError>;

    fn len(&self) -> Result<usize, RegistryError>;

    fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.len()? == 0)
    }

    fn contains(&self, consumer: &ConsumerId) -> Result<bool, RegistryError> {
        Ok(self.pattern_of(consumer)?.is_some())
    }

    /// Drop every registration; later calls return `UnknownRegistry`
    fn teardown(&self);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unknown registry: '{0}' was never created or has been torn down")]
    UnknownRegistry(String),
}
