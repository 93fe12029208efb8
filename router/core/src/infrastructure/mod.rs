// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod subscription_registry;
pub mod pubsub;
pub mod queue;

pub use pubsub::{LocalPubSub, PubSub, TopicSubscription};
pub use subscription_registry::ShardedSubscriptionRegistry;
