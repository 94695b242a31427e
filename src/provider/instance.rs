//! Discovered backend instances.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decode::LoadError;

/// Lifecycle state reported by discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    #[default]
    Running,
    Healthy,
    Starting,
    NotHealthy,
    Stopped,
}

impl InstanceState {
    /// Only running or healthy instances receive traffic.
    pub fn is_eligible(&self) -> bool {
        matches!(self, InstanceState::Running | InstanceState::Healthy)
    }
}

/// An address of the instance on one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAddress {
    #[serde(default)]
    pub network: String,
    pub ip: String,
}

/// One discovered backend replica, immutable for a build cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub addresses: Vec<NetworkAddress>,
    /// Candidate ports, in the order discovery reported them.
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub state: InstanceState,
    /// Tags supplied by discovery itself rather than by labels.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Instance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
            addresses: Vec::new(),
            ports: Vec::new(),
            state: InstanceState::Running,
            tags: Vec::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_address(mut self, network: impl Into<String>, ip: impl Into<String>) -> Self {
        self.addresses.push(NetworkAddress { network: network.into(), ip: ip.into() });
        self
    }

    pub fn with_ports(mut self, ports: &[u16]) -> Self {
        self.ports.extend_from_slice(ports);
        self
    }

    pub fn with_state(mut self, state: InstanceState) -> Self {
        self.state = state;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Load an instance snapshot (a JSON or YAML list of instances).
pub fn load_snapshot(path: &Path) -> Result<Vec<Instance>, LoadError> {
    let content = fs::read_to_string(path)?;
    let instances = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("yml") | Some("yaml") => serde_yaml::from_str(&content)?,
        _ => return Err(LoadError::UnsupportedExtension(path.display().to_string())),
    };
    Ok(instances)
}
