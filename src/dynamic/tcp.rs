//! TCP routers and services.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::decode::{promote, Field, Schema};
use crate::dynamic::http::RouteBinding;

/// TCP sub-tree of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TcpConfiguration {
    pub routers: BTreeMap<String, TcpRouter>,
    pub services: BTreeMap<String, TcpService>,
}

impl Schema for TcpConfiguration {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::map("routers", |c| &mut c.routers),
            Field::map("services", |c| &mut c.services),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TcpRouter {
    #[serde(flatten)]
    pub binding: RouteBinding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TcpRouterTls>,
}

impl TcpRouter {
    pub fn new(rule: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            binding: RouteBinding {
                rule: rule.into(),
                service: service.into(),
                ..Default::default()
            },
            tls: None,
        }
    }
}

impl Schema for TcpRouter {
    fn fields() -> Vec<Field<Self>> {
        let mut fields = promote(|r: &mut TcpRouter| &mut r.binding);
        fields.push(Field::optional("tls", |r: &mut TcpRouter| &mut r.tls));
        fields
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TcpRouterTls {
    pub passthrough: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub options: String,
}

impl Schema for TcpRouterTls {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::bool("passthrough", |t| &mut t.passthrough),
            Field::string("options", |t| &mut t.options),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpService {
    pub load_balancer: TcpLoadBalancer,
}

impl Schema for TcpService {
    fn fields() -> Vec<Field<Self>> {
        vec![Field::nested("loadBalancer", |s| &mut s.load_balancer)]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TcpLoadBalancer {
    pub servers: Vec<TcpServer>,
}

impl TcpLoadBalancer {
    /// TCP balancers carry no options besides their servers.
    pub fn mergeable(&self, _other: &TcpLoadBalancer) -> bool {
        true
    }
}

impl Schema for TcpLoadBalancer {
    fn fields() -> Vec<Field<Self>> {
        vec![Field::list("servers", |lb: &mut TcpLoadBalancer| &mut lb.servers).with_alias("server")]
    }
}

/// One upstream `host:port`. `port` is label input only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TcpServer {
    pub address: String,
    #[serde(skip)]
    pub port: String,
}

impl TcpServer {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: String::new(),
        }
    }
}

impl Schema for TcpServer {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::string("address", |s| &mut s.address),
            Field::string("port", |s| &mut s.port),
        ]
    }
}
