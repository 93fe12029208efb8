// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Log subscriber setup
//!
//! Filter precedence: `RUST_LOG`, then `--log-level` / `SPECTER_LOG_LEVEL`,
//! then `spec.observability.logging.level` from the manifest, then `warn`.
//! The output format comes from the manifest (`json` or `text`).

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use specter_core::domain::node_config::RouterConfigManifest;

const DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

/// Merge the command-line level with the manifest's logging section
pub fn resolve(cli_level: Option<&str>, config: Option<&RouterConfigManifest>) -> LogSettings {
    let logging = config
        .and_then(|c| c.spec.observability.as_ref())
        .map(|o| &o.logging);

    let level = cli_level
        .map(str::to_string)
        .or_else(|| logging.map(|l| l.level.clone()))
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    let format = logging
        .map(|l| LogFormat::parse(&l.format))
        .unwrap_or(LogFormat::Text);

    LogSettings { level, format }
}

/// Initialize tracing subscriber for logging
pub fn init(settings: &LogSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match settings.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.compact().init(),
    }

    Ok(())
}
