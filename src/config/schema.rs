//! Configuration schema definitions.
//!
//! Process settings for the configuration builder. All types derive Serde
//! traits for deserialization from the settings file.

use serde::{Deserialize, Serialize};

use crate::constraints::Constraint;

/// Default label prefix.
pub const DEFAULT_PREFIX: &str = "traefik";

/// Default rule template: a host rule named after the instance.
pub const DEFAULT_RULE: &str = "Host(`{{ normalize .Name }}`)";

/// Root settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Label-driven provider behaviour.
    pub provider: ProviderConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Snapshot watcher settings.
    pub watch: WatchConfig,
}

/// Provider configuration, passed to every build.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Label prefix reserved for routing labels (e.g., "traefik").
    pub prefix: String,

    /// Rule template used when an instance does not label a rule.
    pub default_rule: String,

    /// Expose instances that carry no enable label.
    pub exposed_by_default: bool,

    /// Preferred network when an instance has several addresses.
    pub network: String,

    /// Match constraints against discovery-supplied tags too.
    pub use_discovery_tags: bool,

    /// Tag constraints, all of which must hold.
    pub constraints: Vec<Constraint>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            default_rule: DEFAULT_RULE.to_string(),
            exposed_by_default: true,
            network: String::new(),
            use_discovery_tags: false,
            constraints: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Snapshot watcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    /// Poll interval for filesystems without change notifications.
    pub poll_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { poll_interval_secs: 2 }
    }
}
