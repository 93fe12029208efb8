// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Subscription Patterns
//!
//! A specter declares interest with a flat field map. Compilation splits that
//! map into three disjoint categories whose key union equals the input keys:
//!
//! | Category | Selected when the value is | Matched by |
//! |----------|----------------------------|------------|
//! | `regex` | a string of the form `~r/<body>/` | unanchored regex search |
//! | `wildcard` | any other string containing `*` or `?` | anchored glob |
//! | `exact` | everything else (numbers, bools, nested maps, arrays) | equality |
//!
//! Matching is a subset test: every pattern field must be present in the
//! signal and pass its category rule. Extra signal fields are ignored, so an
//! empty pattern matches every signal.
//!
//! Nested maps are not decomposed. `{"payload": {"kind": "a*"}}` is an exact
//! comparison against the whole `payload` value.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

const REGEX_PREFIX: &str = "~r/";
const REGEX_SUFFIX: char = '/';

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Invalid pattern: field '{field}' has a regex that does not compile: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

/// Glob field kept in its raw form alongside the anchored matcher built from it
#[derive(Debug, Clone)]
pub struct WildcardField {
    glob: String,
    matcher: Regex,
}

impl WildcardField {
    fn new(field: &str, glob: &str) -> Result<Self, PatternError> {
        let matcher = Regex::new(&glob_to_regex(glob)).map_err(|source| {
            PatternError::InvalidPattern {
                field: field.to_string(),
                source,
            }
        })?;
        Ok(Self {
            glob: glob.to_string(),
            matcher,
        })
    }

    pub fn glob(&self) -> &str {
        &self.glob
    }

    fn is_match(&self, value: &str) -> bool {
        self.matcher.is_match(value)
    }
}

/// Compiled subscription filter
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    exact: HashMap<String, Value>,
    wildcard: HashMap<String, WildcardField>,
    regex: HashMap<String, Regex>,
    priority: i32,
}

impl Pattern {
    /// Compile a raw field map into a matcher
    pub fn compile(fields: &Map<String, Value>, priority: i32) -> Result<Self, PatternError> {
        let mut pattern = Pattern {
            priority,
            ..Default::default()
        };

        for (key, value) in fields {
            match value {
                Value::String(s) => {
                    if let Some(body) = regex_body(s) {
                        let compiled =
                            Regex::new(body).map_err(|source| PatternError::InvalidPattern {
                                field: key.clone(),
                                source,
                            })?;
                        pattern.regex.insert(key.clone(), compiled);
                    } else if s.contains('*') || s.contains('?') {
                        pattern
                            .wildcard
                            .insert(key.clone(), WildcardField::new(key, s)?);
                    } else {
                        pattern.exact.insert(key.clone(), value.clone());
                    }
                }
                other => {
                    pattern.exact.insert(key.clone(), other.clone());
                }
            }
        }

        Ok(pattern)
    }

    /// Evaluate a signal's field map, returning the priority on match
    pub fn matches(&self, signal: &Map<String, Value>) -> Option<i32> {
        for (key, expected) in &self.exact {
            if signal.get(key) != Some(expected) {
                return None;
            }
        }

        for (key, wildcard) in &self.wildcard {
            match signal.get(key) {
                Some(Value::String(actual)) if wildcard.is_match(actual) => {}
                _ => return None,
            }
        }

        for (key, regex) in &self.regex {
            match signal.get(key) {
                Some(Value::String(actual)) if regex.is_match(actual) => {}
                _ => return None,
            }
        }

        Some(self.priority)
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn exact_fields(&self) -> &HashMap<String, Value> {
        &self.exact
    }

    pub fn wildcard_fields(&self) -> &HashMap<String, WildcardField> {
        &self.wildcard
    }

    pub fn regex_fields(&self) -> &HashMap<String, Regex> {
        &self.regex
    }

    pub fn field_count(&self) -> usize {
        self.exact.len() + self.wildcard.len() + self.regex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }
}

pub fn compile(fields: &Map<String, Value>, priority: i32) -> Result<Pattern, PatternError> {
    Pattern::compile(fields, priority)
}

pub fn matches(pattern: &Pattern, signal: &Map<String, Value>) -> Option<i32> {
    pattern.matches(signal)
}

fn regex_body(value: &str) -> Option<&str> {
    value
        .strip_prefix(REGEX_PREFIX)
        .and_then(|rest| rest.strip_suffix(REGEX_SUFFIX))
}

/// `*` -> `.*`, `?` -> `.`, everything else literal, anchored on both ends
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push_str("(?s)^");
    let mut literal = String::new();
    for ch in glob.chars() {
        match ch {
            '*' | '?' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}
