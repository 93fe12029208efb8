// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Metric names emitted through the `metrics` facade. The core never installs
// a recorder; the embedding process decides where these go.

pub const SIGNALS_ROUTED: &str = "specter_signals_routed_total";
pub const SIGNAL_MATCHES: &str = "specter_signal_matches_total";
pub const DELIVERIES: &str = "specter_deliveries_total";
pub const QUEUE_REJECTIONS: &str = "specter_queue_rejections_total";
