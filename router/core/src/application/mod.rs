// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod router;
pub mod delivery_dispatcher;
pub mod routing_service;

// Re-export services for convenience
pub use delivery_dispatcher::DeliveryDispatcher;
pub use router::{RouterDirectory, RouterError, SignalRouter};
pub use routing_service::RoutingService;
