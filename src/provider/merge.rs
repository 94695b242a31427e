//! Merge of per-instance configurations.
//!
//! # Responsibilities
//! - Union services whose load balancer options agree, concatenating servers
//! - Deduplicate routers and middlewares that are equal
//! - Drop any entity defined differently by two instances
//! - Drop routers whose service does not exist after the merge
//!
//! # Design Decisions
//! - Conflicts fail closed: no priority, no first-seen-wins
//! - Servers keep instance input order
//! - Once an entity conflicts it stays out of the cycle

use std::collections::{BTreeMap, BTreeSet};

use crate::dynamic::{Configuration, Middleware, Router, Service, TcpRouter, TcpService};

/// One entity section (e.g. HTTP services) being merged.
#[derive(Debug)]
struct Section<T> {
    kind: &'static str,
    entries: BTreeMap<String, T>,
    origins: BTreeMap<String, Vec<String>>,
    conflicts: BTreeSet<String>,
}

impl<T> Section<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
            origins: BTreeMap::new(),
            conflicts: BTreeSet::new(),
        }
    }

    /// Add `item` from `instance`. `combine` folds it into an existing entry
    /// and returns false when the two cannot be reconciled.
    fn add(&mut self, instance: &str, name: String, item: T, combine: impl FnOnce(&mut T, T) -> bool) {
        self.origins.entry(name.clone()).or_default().push(instance.to_string());
        if self.conflicts.contains(&name) {
            return;
        }
        match self.entries.get_mut(&name) {
            None => {
                self.entries.insert(name, item);
            }
            Some(existing) => {
                if !combine(existing, item) {
                    self.entries.remove(&name);
                    self.conflicts.insert(name);
                }
            }
        }
    }

    fn finish(self) -> BTreeMap<String, T> {
        for name in &self.conflicts {
            let instances = self.origins.get(name).cloned().unwrap_or_default();
            tracing::error!(
                kind = self.kind,
                name = %name,
                instances = ?instances,
                "Entity defined differently by several instances, dropping it"
            );
        }
        self.entries
    }
}

fn equal<T: PartialEq>(existing: &mut T, item: T) -> bool {
    *existing == item
}

fn union_http(existing: &mut Service, item: Service) -> bool {
    if !existing.load_balancer.mergeable(&item.load_balancer) {
        return false;
    }
    existing.load_balancer.servers.extend(item.load_balancer.servers);
    true
}

fn union_tcp(existing: &mut TcpService, item: TcpService) -> bool {
    if !existing.load_balancer.mergeable(&item.load_balancer) {
        return false;
    }
    existing.load_balancer.servers.extend(item.load_balancer.servers);
    true
}

/// Accumulates per-instance configurations in input order.
#[derive(Debug)]
pub struct Merger {
    http_routers: Section<Router>,
    http_middlewares: Section<Middleware>,
    http_services: Section<Service>,
    tcp_routers: Section<TcpRouter>,
    tcp_services: Section<TcpService>,
}

impl Default for Merger {
    fn default() -> Self {
        Self {
            http_routers: Section::new("http router"),
            http_middlewares: Section::new("http middleware"),
            http_services: Section::new("http service"),
            tcp_routers: Section::new("tcp router"),
            tcp_services: Section::new("tcp service"),
        }
    }
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, instance: &str, config: Configuration) {
        let Configuration { http, tcp } = config;
        for (name, router) in http.routers {
            self.http_routers.add(instance, name, router, equal);
        }
        for (name, middleware) in http.middlewares {
            self.http_middlewares.add(instance, name, middleware, equal);
        }
        for (name, service) in http.services {
            self.http_services.add(instance, name, service, union_http);
        }
        for (name, router) in tcp.routers {
            self.tcp_routers.add(instance, name, router, equal);
        }
        for (name, service) in tcp.services {
            self.tcp_services.add(instance, name, service, union_tcp);
        }
    }

    /// Resolve conflicts and router references into the final configuration.
    pub fn finish(self) -> Configuration {
        let mut config = Configuration::default();
        config.http.routers = self.http_routers.finish();
        config.http.middlewares = self.http_middlewares.finish();
        config.http.services = self.http_services.finish();
        config.tcp.routers = self.tcp_routers.finish();
        config.tcp.services = self.tcp_services.finish();

        let http_services = &config.http.services;
        config.http.routers.retain(|name, router| {
            let found = http_services.contains_key(&router.binding.service);
            if !found {
                tracing::warn!(router = %name, service = %router.binding.service, "Dropping http router, its service does not exist");
            }
            found
        });

        let tcp_services = &config.tcp.services;
        config.tcp.routers.retain(|name, router| {
            let found = tcp_services.contains_key(&router.binding.service);
            if !found {
                tracing::warn!(router = %name, service = %router.binding.service, "Dropping tcp router, its service does not exist");
            }
            found
        });

        config
    }
}

/// Merge configurations given as `(instance name, configuration)` pairs.
pub fn merge<I>(configs: I) -> Configuration
where
    I: IntoIterator<Item = (String, Configuration)>,
{
    let mut merger = Merger::new();
    for (instance, config) in configs {
        merger.add(&instance, config);
    }
    merger.finish()
}
