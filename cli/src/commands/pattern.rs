// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Pattern commands
//!
//! Commands: check, explain

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use specter_core::domain::pattern::Pattern;

use super::parse_object_arg;

#[derive(Subcommand)]
pub enum PatternCommand {
    /// Test a pattern against a signal field map
    Check {
        /// Pattern as JSON object (or @file)
        #[arg(short, long)]
        pattern: String,

        /// Signal fields as JSON object (or @file)
        #[arg(short, long)]
        signal: String,

        /// Priority reported on match
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        priority: i32,
    },

    /// Show how each field of a pattern is compiled
    Explain {
        /// Pattern as JSON object (or @file)
        #[arg(short, long)]
        pattern: String,
    },
}

pub async fn handle_command(command: PatternCommand) -> Result<()> {
    match command {
        PatternCommand::Check {
            pattern,
            signal,
            priority,
        } => check(&pattern, &signal, priority),
        PatternCommand::Explain { pattern } => explain(&pattern),
    }
}

fn compile_arg(raw: &str, priority: i32) -> Result<Pattern> {
    let fields = parse_object_arg(raw, "pattern")?;
    Pattern::compile(&fields, priority).context("Pattern failed to compile")
}

fn check(pattern: &str, signal: &str, priority: i32) -> Result<()> {
    let pattern = compile_arg(pattern, priority)?;
    let fields = parse_object_arg(signal, "signal")?;

    match pattern.matches(&fields) {
        Some(priority) => println!("{}", format!("✓ Match (priority {})", priority).green()),
        None => println!("{}", "✗ No match".yellow()),
    }

    Ok(())
}

fn explain(pattern: &str) -> Result<()> {
    let pattern = compile_arg(pattern, 0)?;

    if pattern.is_empty() {
        println!("{}", "Empty pattern: matches every signal".dimmed());
        return Ok(());
    }

    let mut rows: Vec<(String, &str, String)> = Vec::with_capacity(pattern.field_count());
    for (field, value) in pattern.exact_fields() {
        rows.push((field.clone(), "exact", value.to_string()));
    }
    for (field, wildcard) in pattern.wildcard_fields() {
        rows.push((field.clone(), "wildcard", wildcard.glob().to_string()));
    }
    for (field, regex) in pattern.regex_fields() {
        rows.push((field.clone(), "regex", regex.as_str().to_string()));
    }
    rows.sort();

    println!("{}", "Compiled pattern:".bold());
    for (field, kind, matcher) in rows {
        println!("  {:<16} {:<9} {}", field.bold(), kind, matcher);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_accepts_matching_and_non_matching() {
        check(r#"{"schema_id": "task.*"}"#, r#"{"schema_id": "task.created"}"#, 5).unwrap();
        check(r#"{"schema_id": "task.*"}"#, r#"{"schema_id": "audit"}"#, 0).unwrap();
    }

    #[test]
    fn test_invalid_regex_is_reported() {
        let err = compile_arg(r#"{"sender": "~r/(/"}"#, 0).unwrap_err();
        assert!(err.to_string().contains("Pattern failed to compile"));
    }

    #[test]
    fn test_explain_empty_pattern() {
        explain("{}").unwrap();
    }
}
