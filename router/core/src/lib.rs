// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `specter-router-core`: Content-Based Signal Routing
//!
//! Delivers typed signals between independently running specters. Consumers
//! register declarative patterns, producers emit signals, and the router
//! answers "which consumers match this signal".
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `Signal`, `Pattern`, registry/queue/delivery contracts, config manifest |
//! | [`infrastructure`] | Infrastructure | sharded registry, local pub/sub, the three queue backends |
//! | [`application`] | Application | `SignalRouter`, `RouterDirectory`, `DeliveryDispatcher`, `RoutingService` |
//! | [`telemetry`] | Cross-cutting | metric names |
//!
//! ## Data Flow
//!
//! ```text
//! producer -> RouterDirectory::route_signal(name, signal)
//!          -> SubscriptionRegistry::find_matching(fields)
//!          -> [consumer ids]
//!          -> DeliveryDispatcher::deliver(signal, id)   (fire-and-forget)
//! ```

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod telemetry;

pub use domain::*;
