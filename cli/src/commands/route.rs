// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Offline routing dry-run
//!
//! Loads a subscriptions file into a router started from the node
//! configuration, routes one signal, and prints the ranked matches.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::info;

use specter_core::application::RouterDirectory;
use specter_core::domain::node_config::RouterConfigManifest;
use specter_core::domain::signal::ConsumerId;

use super::parse_object_arg;

#[derive(Args)]
pub struct RouteArgs {
    /// YAML file listing subscriptions
    #[arg(short = 'S', long, value_name = "FILE")]
    subscriptions: PathBuf,

    /// Signal fields as JSON object (or @file)
    #[arg(short, long)]
    signal: String,

    /// Router to load subscriptions into (default: first configured router)
    #[arg(short, long)]
    router: Option<String>,
}

/// One entry of a subscriptions file
#[derive(Debug, Deserialize)]
pub struct SubscriptionEntry {
    pub consumer: String,

    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub pattern: Map<String, Value>,
}

pub fn load_subscriptions(path: &Path) -> Result<Vec<SubscriptionEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read subscriptions from {:?}", path))?;
    serde_yaml::from_str(&content).context("Failed to parse subscriptions YAML")
}

pub async fn handle_command(args: RouteArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = RouterConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let subscriptions = load_subscriptions(&args.subscriptions)?;
    let fields = parse_object_arg(&args.signal, "signal")?;

    let router_name = args
        .router
        .or_else(|| config.spec.routers.first().cloned())
        .context("No router configured")?;

    let matches = dry_run(&config, &router_name, subscriptions, &fields)?;

    if matches.is_empty() {
        println!("{}", "No subscriptions matched".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("{} match(es) on router '{}':", matches.len(), router_name).bold()
    );
    for (consumer, priority) in matches {
        println!("  {:>5}  {}", priority, consumer);
    }

    Ok(())
}

/// Register every entry on the named router and route `fields` through it
pub fn dry_run(
    config: &RouterConfigManifest,
    router_name: &str,
    subscriptions: Vec<SubscriptionEntry>,
    fields: &Map<String, Value>,
) -> Result<Vec<(ConsumerId, i32)>> {
    let directory = RouterDirectory::from_config(config)?;
    let router = directory
        .get(router_name)
        .with_context(|| format!("Router '{}' is not in spec.routers", router_name))?;

    let count = subscriptions.len();
    for entry in subscriptions {
        router
            .register_fields(entry.consumer.as_str(), &entry.pattern, entry.priority)
            .with_context(|| format!("Invalid pattern for consumer '{}'", entry.consumer))?;
    }
    info!(router = %router_name, subscriptions = count, "Loaded subscriptions");

    let matches = router.registry().find_matching_ranked(fields)?;
    directory.stop(router_name)?;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_example_subscriptions_parse() {
        let entries: Vec<SubscriptionEntry> =
            serde_yaml::from_str(include_str!("../../templates/subscriptions-example.yaml")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].priority, 10);
        assert_eq!(entries[1].priority, 0);
    }

    #[test]
    fn test_dry_run_ranks_matches() {
        let entries: Vec<SubscriptionEntry> =
            serde_yaml::from_str(include_str!("../../templates/subscriptions-example.yaml")).unwrap();
        let config = RouterConfigManifest::default();

        let matches = dry_run(
            &config,
            "default",
            entries,
            &fields(json!({
                "schema_id": "task.created",
                "recipient": "worker-7",
                "sender": "planner"
            })),
        )
        .unwrap();

        assert_eq!(
            matches,
            vec![
                (ConsumerId::from("task-worker"), 10),
                (ConsumerId::from("auditor"), 0),
            ]
        );
    }

    #[test]
    fn test_dry_run_unknown_router() {
        let config = RouterConfigManifest::default();
        let err = dry_run(&config, "elsewhere", Vec::new(), &Map::new()).unwrap_err();
        assert!(err.to_string().contains("not in spec.routers"));
    }

    #[test]
    fn test_dry_run_reports_bad_pattern() {
        let config = RouterConfigManifest::default();
        let entries = vec![SubscriptionEntry {
            consumer: "broken".to_string(),
            priority: 0,
            pattern: fields(json!({"sender": "~r/[/"})),
        }];
        let err = dry_run(&config, "default", entries, &Map::new()).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
