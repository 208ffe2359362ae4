use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Configuration for one pooled host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Host identity, used in diagnostics (e.g. "cass-1.example.com:9160")
    pub name: String,

    /// Maximum number of handles lent out at once
    #[serde(default = "default_max_active")]
    pub max_active: usize,

    /// How long a borrow may wait when the pool is exhausted, in
    /// milliseconds. Zero or negative means wait indefinitely.
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_when_exhausted_ms: i64,
}

fn default_max_active() -> usize {
    50
}

fn default_max_wait_ms() -> i64 {
    -1
}

impl HostConfig {
    /// Create a configuration with default pool sizing for the given host
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_active: default_max_active(),
            max_wait_when_exhausted_ms: default_max_wait_ms(),
        }
    }

    /// Normalized exhausted-wait bound. A configured zero or negative value
    /// maps to `Duration::ZERO`, meaning "wait forever".
    pub fn max_wait_when_exhausted(&self) -> Duration {
        if self.max_wait_when_exhausted_ms <= 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(self.max_wait_when_exhausted_ms as u64)
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("host name must not be empty");
        }
        if self.max_active == 0 {
            anyhow::bail!("max_active must be greater than zero for host '{}'", self.name);
        }
        Ok(())
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Named host entries
    #[serde(default)]
    pub hosts: HashMap<String, HostConfig>,

    /// Host entry to use when none is specified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_host: Option<String>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self {
            hosts: HashMap::new(),
            default_host: None,
        }
    }

    /// Get a host entry by name, or the default entry if not specified
    pub fn get_host(&self, name: Option<&str>) -> Option<&HostConfig> {
        if let Some(name) = name {
            self.hosts.get(name)
        } else if let Some(default) = &self.default_host {
            self.hosts.get(default)
        } else {
            self.hosts.values().next()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config: Config = serde_yaml::from_str(&content)
        .context("Failed to parse YAML configuration")?;

    for host in config.hosts.values() {
        host.validate()?;
    }

    Ok(config)
}

/// Load configuration from environment variables
///
/// - POOL_HOST (required, host identity string)
/// - POOL_MAX_ACTIVE (optional, defaults to 50)
/// - POOL_MAX_WAIT_MS (optional, defaults to -1 = wait forever)
pub fn load_from_env() -> Result<Config> {
    // Try to load .env file if it exists (don't fail if it doesn't)
    let _ = dotenvy::dotenv();

    let mut config = Config::new();

    let name = std::env::var("POOL_HOST").context("POOL_HOST environment variable not set")?;

    let mut host = HostConfig::new(name);

    if let Ok(max_active) = std::env::var("POOL_MAX_ACTIVE") {
        host.max_active = max_active
            .parse()
            .context("POOL_MAX_ACTIVE is not a valid integer")?;
    }

    if let Ok(max_wait) = std::env::var("POOL_MAX_WAIT_MS") {
        host.max_wait_when_exhausted_ms = max_wait
            .parse()
            .context("POOL_MAX_WAIT_MS is not a valid integer")?;
    }

    host.validate()?;

    config.hosts.insert("default".to_string(), host);
    config.default_host = Some("default".to_string());

    Ok(config)
}

/// Load configuration from file or environment
///
/// Tries the YAML file when a path is given, otherwise falls back to
/// environment variables. When a host name is given it becomes the default
/// entry.
pub fn load_config(config_path: Option<&str>, host_name: Option<&str>) -> Result<Config> {
    if let Some(path) = config_path {
        let mut config = load_from_yaml(path)?;

        if let Some(name) = host_name {
            if !config.hosts.contains_key(name) {
                anyhow::bail!("Host '{}' not found in config file", name);
            }
            config.default_host = Some(name.to_string());
        }

        Ok(config)
    } else {
        load_from_env()
    }
}
