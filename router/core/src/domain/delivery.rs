// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Delivery Handler Domain Interface
//
// The last hop between the router and a consumer. Implementations live with
// the collaborator that owns the consumer (agent runner, HTTP adapter, test
// double). The core only ever calls them through the DeliveryDispatcher.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::signal::{ConsumerId, Signal};

#[async_trait]
pub trait DeliveryHandler: Send + Sync {
    /// Hand a matched signal to one consumer
    async fn deliver(&self, signal: &Signal, consumer: &ConsumerId) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("Consumer not reachable: {0}")]
    Unreachable(String),

    #[error("Consumer rejected signal: {0}")]
    Rejected(String),

    #[error("Delivery timed out after {0} ms")]
    Timeout(u64),

    #[error("Delivery failed: {0}")]
    Failed(String),
}
