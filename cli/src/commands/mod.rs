// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the specter CLI

pub mod config;
pub mod pattern;
pub mod route;

pub use self::config::ConfigCommand;
pub use self::pattern::PatternCommand;
pub use self::route::RouteArgs;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

/// Parse a JSON object argument, or read it from a file when prefixed with `@`
pub(crate) fn parse_object_arg(raw: &str, what: &str) -> Result<Map<String, Value>> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {} from {:?}", what, path))?,
        None => raw.to_string(),
    };

    match serde_json::from_str::<Value>(&text)
        .with_context(|| format!("Failed to parse {} as JSON", what))?
    {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("{} must be a JSON object, got {}", what, other),
    }
}
