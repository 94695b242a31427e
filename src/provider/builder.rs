//! Per-snapshot configuration assembly.
//!
//! # Responsibilities
//! - Decode each instance's labels into a partial configuration
//! - Apply eligibility (enable flag, health, tag constraints)
//! - Synthesize default services, servers and routers
//! - Merge every instance's contribution with fail-closed conflicts
//!
//! # Design Decisions
//! - The builder holds only immutable settings; `build` is re-entrant
//! - Per-instance failures skip the instance, never the cycle
//! - Entity keys derived from instance names are normalized

use crate::config::schema::ProviderConfig;
use crate::constraints::{check_instance, Eligibility};
use crate::dynamic::{
    Configuration, HttpConfiguration, Router, Server, Service, TcpConfiguration, TcpServer,
    TcpService,
};
use crate::labels::{decode_labels, EndpointSelection, InstanceLabels, Protocol};
use crate::provider::endpoint::{host_port, http_url, resolve_host, resolve_port, EndpointError};
use crate::provider::instance::Instance;
use crate::provider::merge::Merger;
use crate::rule::{normalize_name, RuleContext, RuleTemplate};

/// Builds a [`Configuration`] from instance snapshots.
#[derive(Debug)]
pub struct ConfigurationBuilder {
    provider: ProviderConfig,
    default_rule: RuleTemplate,
}

impl ConfigurationBuilder {
    pub fn new(provider: ProviderConfig) -> Self {
        let default_rule = RuleTemplate::new(provider.default_rule.clone());
        Self { provider, default_rule }
    }

    /// Assemble the configuration of one snapshot.
    pub fn build(&self, instances: &[Instance]) -> Configuration {
        let mut merger = Merger::new();
        for instance in instances {
            if let Some(config) = self.build_instance(instance) {
                merger.add(&instance.name, config);
            }
        }
        let config = merger.finish();
        tracing::debug!(
            instances = instances.len(),
            http_routers = config.http.routers.len(),
            http_services = config.http.services.len(),
            tcp_routers = config.tcp.routers.len(),
            tcp_services = config.tcp.services.len(),
            "Configuration built"
        );
        config
    }

    /// The contribution of a single instance, or `None` when it is excluded
    /// or its endpoints cannot be resolved.
    pub fn build_instance(&self, instance: &Instance) -> Option<Configuration> {
        let decoded = decode_labels(
            &instance.labels,
            &self.provider.prefix,
            self.provider.exposed_by_default,
        );
        report_label_problems(instance, &decoded);

        let mut tags = decoded.settings.tags.clone();
        if self.provider.use_discovery_tags {
            tags.extend(instance.tags.iter().cloned());
        }
        let eligibility = Eligibility {
            enabled: decoded.settings.enable,
            healthy: instance.state.is_eligible(),
            tags: &tags,
        };
        if let Err(reason) = check_instance(eligibility, &self.provider.constraints) {
            tracing::debug!(instance = %instance.name, reason = %reason, "Filtering instance");
            return None;
        }

        let service_name = normalize_name(&instance.name);
        let want_tcp = decoded.declares_protocol(Protocol::Tcp);
        let want_http = decoded.declares_protocol(Protocol::Http) || !want_tcp;

        let InstanceLabels { settings, mut configuration, .. } = decoded;
        let endpoint = &settings.endpoint;

        if want_tcp {
            if let Err(e) = self.complete_tcp(&mut configuration.tcp, instance, endpoint, &service_name) {
                tracing::error!(instance = %instance.name, error = %e, "Unable to resolve TCP endpoint, skipping instance");
                return None;
            }
        } else {
            configuration.tcp = TcpConfiguration::default();
        }

        if want_http {
            if let Err(e) = self.complete_http(&mut configuration.http, instance, endpoint, &service_name) {
                tracing::error!(instance = %instance.name, error = %e, "Unable to resolve HTTP endpoint, skipping instance");
                return None;
            }
        } else {
            configuration.http = HttpConfiguration::default();
        }

        Some(configuration)
    }

    fn complete_tcp(
        &self,
        tcp: &mut TcpConfiguration,
        instance: &Instance,
        endpoint: &EndpointSelection,
        service_name: &str,
    ) -> Result<(), EndpointError> {
        if tcp.services.is_empty() {
            tcp.services.insert(service_name.to_string(), TcpService::default());
        }

        for service in tcp.services.values_mut() {
            let servers = &mut service.load_balancer.servers;
            if servers.is_empty() {
                servers.push(TcpServer::default());
            }
            for server in servers.iter_mut() {
                if server.address.is_empty() {
                    let host = resolve_host(instance, endpoint, &self.provider.network)?;
                    let port = resolve_port(instance, &server.port)?;
                    server.address = host_port(host, port);
                }
                server.port.clear();
            }
        }

        let single_service = single_key(&tcp.services);
        tcp.routers.retain(|name, router| {
            if router.binding.rule.is_empty() {
                tracing::warn!(instance = %instance.name, router = %name, "TCP router has no rule, dropping it");
                return false;
            }
            if router.binding.service.is_empty() {
                match &single_service {
                    Some(service) => router.binding.service = service.clone(),
                    None => {
                        tracing::warn!(
                            instance = %instance.name,
                            router = %name,
                            "Could not define the service name for the TCP router: too many services"
                        );
                        return false;
                    }
                }
            }
            true
        });
        Ok(())
    }

    fn complete_http(
        &self,
        http: &mut HttpConfiguration,
        instance: &Instance,
        endpoint: &EndpointSelection,
        service_name: &str,
    ) -> Result<(), EndpointError> {
        if http.services.is_empty() {
            http.services.insert(service_name.to_string(), Service::default());
        }

        for service in http.services.values_mut() {
            let servers = &mut service.load_balancer.servers;
            if servers.is_empty() {
                servers.push(Server::default());
            }
            for server in servers.iter_mut() {
                if server.url.is_empty() {
                    let host = resolve_host(instance, endpoint, &self.provider.network)?;
                    let port = resolve_port(instance, &server.port)?;
                    server.url = http_url(&server.scheme, host, port);
                }
                server.scheme.clear();
                server.port.clear();
            }
        }

        let single_service = single_key(&http.services);
        if http.routers.is_empty() && single_service.is_some() {
            http.routers.insert(service_name.to_string(), Router::default());
        }

        let mut default_rule: Option<String> = None;
        http.routers.retain(|name, router| {
            if router.binding.rule.is_empty() {
                let rule = default_rule.get_or_insert_with(|| {
                    self.default_rule.render(RuleContext {
                        name: &instance.name,
                        labels: &instance.labels,
                    })
                });
                if rule.is_empty() {
                    tracing::warn!(instance = %instance.name, router = %name, "Router has no rule, dropping it");
                    return false;
                }
                router.binding.rule = rule.clone();
            }
            if router.binding.service.is_empty() {
                match &single_service {
                    Some(service) => router.binding.service = service.clone(),
                    None => {
                        tracing::warn!(
                            instance = %instance.name,
                            router = %name,
                            "Could not define the service name for the router: too many services"
                        );
                        return false;
                    }
                }
            }
            true
        });
        Ok(())
    }
}

fn single_key<V>(map: &std::collections::BTreeMap<String, V>) -> Option<String> {
    if map.len() == 1 {
        map.keys().next().cloned()
    } else {
        None
    }
}

fn report_label_problems(instance: &Instance, decoded: &InstanceLabels) {
    for label in &decoded.malformed {
        tracing::warn!(instance = %instance.name, label = %label.key, reason = label.reason, "Ignoring malformed label");
    }
    for key in &decoded.unsupported {
        tracing::warn!(instance = %instance.name, label = %key, "Ignoring unsupported label");
    }
    for error in &decoded.errors {
        tracing::warn!(instance = %instance.name, path = %error.path, error = %error.message, "Ignoring invalid label value");
    }
}
