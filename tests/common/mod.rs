//! Shared fixtures for integration tests.

use edge_router::{ConfigurationBuilder, Instance, ProviderConfig};

/// Default rule used by the scenarios: a host per normalized instance name.
pub const TEST_RULE: &str = "Host(`{{ normalize .Name }}.traefik.wtf`)";

/// A running instance reachable at `ip` on port 80.
pub fn instance(name: &str, ip: &str) -> Instance {
    Instance::new(name).with_address("bridge", ip).with_ports(&[80])
}

/// Attach labels given as `(key, value)` pairs.
#[allow(dead_code)]
pub fn labelled(mut instance: Instance, labels: &[(&str, &str)]) -> Instance {
    for (key, value) in labels {
        instance = instance.with_label(*key, *value);
    }
    instance
}

pub fn builder() -> ConfigurationBuilder {
    builder_with_rule(TEST_RULE)
}

pub fn builder_with_rule(rule: &str) -> ConfigurationBuilder {
    ConfigurationBuilder::new(ProviderConfig {
        default_rule: rule.to_string(),
        ..Default::default()
    })
}
