// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: signals, patterns and the contracts the infrastructure
//! layer implements (registry, queues, delivery handlers).

pub mod signal;
pub mod pattern;
pub mod registry;
pub mod queue;
pub mod delivery;
pub mod node_config;
