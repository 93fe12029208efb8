// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Router Configuration Types
//
// Defines the configuration schema for a specter routing node:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Routers started at boot (one independent routing domain each)
// - Queue backend selection and capacity
// - Delivery dispatcher settings
// - Logging settings

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::domain::queue::DEFAULT_MAX_SIZE;

pub const API_VERSION: &str = "100monkeys.ai/v1";
pub const KIND: &str = "RouterConfig";

/// Top-level Kubernetes-style router configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfigManifest {
    /// API version (must be "100monkeys.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "RouterConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: RouterConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfigSpec {
    /// Router names started at boot
    #[serde(default = "default_routers")]
    pub routers: Vec<String>,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackend {
    /// Single owning task, unbounded
    InMemory,
    /// Concurrent ordered table keyed by sequence number
    OrderedTable,
    /// Bounded single-owner queue with broadcast notifications
    Distributed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_queue_backend")]
    pub backend: QueueBackend,

    /// Queue name; distributed queues broadcast on "queue:<name>"
    #[serde(default = "default_queue_name")]
    pub name: String,

    /// Capacity ceiling (distributed backend only)
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Per-delivery timeout in milliseconds
    #[serde(default = "default_delivery_timeout")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, text)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_routers() -> Vec<String> {
    vec!["default".to_string()]
}

fn default_queue_backend() -> QueueBackend {
    QueueBackend::InMemory
}

fn default_queue_name() -> String {
    "signals".to_string()
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

fn default_delivery_timeout() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: default_queue_backend(),
            name: default_queue_name(),
            max_size: default_max_size(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_delivery_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for RouterConfigSpec {
    fn default() -> Self {
        Self {
            routers: default_routers(),
            queue: QueueConfig::default(),
            delivery: DeliveryConfig::default(),
            observability: None,
        }
    }
}

impl Default for RouterConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "specter-node".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: RouterConfigSpec::default(),
        }
    }
}

impl RouterConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. SPECTER_CONFIG_PATH environment variable
    /// 2. ./specter-config.yaml (working directory)
    /// 3. ~/.specter/config.yaml (user home)
    /// 4. /etc/specter/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SPECTER_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./specter-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".specter").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/specter/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path fails loudly if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SPECTER_QUEUE_MAX_SIZE") {
            match val.parse::<usize>() {
                Ok(size) => {
                    tracing::info!("Environment override: SPECTER_QUEUE_MAX_SIZE={}", size);
                    self.spec.queue.max_size = size;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for SPECTER_QUEUE_MAX_SIZE: '{}'. Expected integer. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("SPECTER_DELIVERY_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) => {
                    tracing::info!("Environment override: SPECTER_DELIVERY_TIMEOUT_MS={}", ms);
                    self.spec.delivery.timeout_ms = ms;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for SPECTER_DELIVERY_TIMEOUT_MS: '{}'. Expected integer. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let mut seen = HashSet::new();
        for router in &self.spec.routers {
            if router.is_empty() {
                anyhow::bail!("Router name cannot be empty");
            }
            if !seen.insert(router.as_str()) {
                anyhow::bail!("Duplicate router name: '{}'", router);
            }
        }

        if self.spec.queue.name.is_empty() {
            anyhow::bail!("spec.queue.name cannot be empty");
        }

        if self.spec.queue.max_size == 0 {
            anyhow::bail!("spec.queue.max_size must be greater than zero");
        }

        if self.spec.delivery.timeout_ms == 0 {
            anyhow::bail!("spec.delivery.timeout_ms must be greater than zero");
        }

        Ok(())
    }
}
