// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Routing Service
//!
//! Wires the two halves of the data flow together: resolve the named router,
//! find matching consumers, then hand each match to the delivery dispatcher.
//! No business logic of its own; routing errors surface to the producer,
//! delivery outcomes never do.

use std::sync::Arc;
use tracing::debug;

use crate::application::delivery_dispatcher::DeliveryDispatcher;
use crate::application::router::{RouterDirectory, RouterError};
use crate::domain::signal::{ConsumerId, Signal};

pub struct RoutingService {
    directory: Arc<RouterDirectory>,
    dispatcher: Arc<DeliveryDispatcher>,
}

impl RoutingService {
    pub fn new(directory: Arc<RouterDirectory>, dispatcher: Arc<DeliveryDispatcher>) -> Self {
        Self {
            directory,
            dispatcher,
        }
    }

    pub fn directory(&self) -> &Arc<RouterDirectory> {
        &self.directory
    }

    /// Route a signal and dispatch it to every match, returning the matched ids
    pub fn emit(&self, router_name: &str, signal: Signal) -> Result<Vec<ConsumerId>, RouterError> {
        let matched = self.directory.route_signal(router_name, &signal)?;
        debug!(
            router = %router_name,
            signal_id = %signal.id,
            matches = matched.len(),
            "Dispatching routed signal"
        );
        if !matched.is_empty() {
            // Handles dropped on purpose: delivery is fire-and-forget
            let _ = self.dispatcher.deliver_all(signal, matched.clone());
        }
        Ok(matched)
    }
}
