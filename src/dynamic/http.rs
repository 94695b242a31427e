//! HTTP routers and services.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::decode::{populate_into, promote, Field, FieldKind, Schema};
use crate::dynamic::middleware::{Middleware, MiddlewareOptions};

/// HTTP sub-tree of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HttpConfiguration {
    pub routers: BTreeMap<String, Router>,
    pub middlewares: BTreeMap<String, Middleware>,
    pub services: BTreeMap<String, Service>,
}

impl Schema for HttpConfiguration {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::map("routers", |c| &mut c.routers),
            Field::custom("middlewares", FieldKind::Map, |c: &mut Self, node, decoder| {
                if !decoder.expect_section(node) {
                    return;
                }
                for (name, child) in node.children() {
                    decoder.within(name, |decoder| {
                        let mut options = MiddlewareOptions::default();
                        populate_into(child, &mut options, decoder);
                        match Middleware::try_from(options) {
                            Ok(middleware) => {
                                c.middlewares.insert(name.clone(), middleware);
                            }
                            Err(e) => decoder.error(e),
                        }
                    });
                }
            }),
            Field::map("services", |c| &mut c.services),
        ]
    }
}

/// Fields shared by HTTP and TCP routers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteBinding {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry_points: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub service: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub rule: String,
}

impl Schema for RouteBinding {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::string_list("entryPoints", |b| &mut b.entry_points),
            Field::string("service", |b| &mut b.service),
            Field::string("rule", |b| &mut b.rule),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Router {
    #[serde(flatten)]
    pub binding: RouteBinding,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub middlewares: Vec<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub priority: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<RouterTls>,
}

impl Router {
    pub fn new(rule: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            binding: RouteBinding {
                rule: rule.into(),
                service: service.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

impl Schema for Router {
    fn fields() -> Vec<Field<Self>> {
        let mut fields = promote(|r: &mut Router| &mut r.binding);
        fields.extend(vec![
            Field::string_list("middlewares", |r: &mut Router| &mut r.middlewares),
            Field::number("priority", |r: &mut Router| &mut r.priority),
            Field::optional("tls", |r: &mut Router| &mut r.tls),
        ]);
        fields
    }
}

/// TLS marker of an HTTP router.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterTls {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub options: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cert_resolver: String,
}

impl Schema for RouterTls {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::string("options", |t| &mut t.options),
            Field::string("certResolver", |t| &mut t.cert_resolver),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub load_balancer: LoadBalancer,
}

impl Schema for Service {
    fn fields() -> Vec<Field<Self>> {
        vec![Field::nested("loadBalancer", |s| &mut s.load_balancer)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub servers: Vec<Server>,
    pub pass_host_header: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stickiness: Option<Stickiness>,
}

impl Default for LoadBalancer {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            pass_host_header: true,
            health_check: None,
            stickiness: None,
        }
    }
}

impl LoadBalancer {
    /// Equal once the server lists are ignored.
    pub fn mergeable(&self, other: &LoadBalancer) -> bool {
        self.pass_host_header == other.pass_host_header
            && self.health_check == other.health_check
            && self.stickiness == other.stickiness
    }
}

impl Schema for LoadBalancer {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::list("servers", |lb: &mut LoadBalancer| &mut lb.servers).with_alias("server"),
            Field::bool("passHostHeader", |lb: &mut LoadBalancer| &mut lb.pass_host_header),
            Field::optional("healthCheck", |lb: &mut LoadBalancer| &mut lb.health_check),
            Field::optional("stickiness", |lb: &mut LoadBalancer| &mut lb.stickiness),
        ]
    }
}

/// One upstream endpoint.
///
/// `scheme` and `port` only exist in label form; they are consumed when the
/// URL is resolved and never serialised.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Server {
    pub url: String,
    #[serde(skip)]
    pub scheme: String,
    #[serde(skip)]
    pub port: String,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

impl Schema for Server {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::string("url", |s| &mut s.url),
            Field::string("scheme", |s| &mut s.scheme),
            Field::string("port", |s| &mut s.port),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scheme: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::dynamic::duration_format::serialize"
    )]
    pub interval: Option<Duration>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::dynamic::duration_format::serialize"
    )]
    pub timeout: Option<Duration>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Schema for HealthCheck {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::string("scheme", |h| &mut h.scheme),
            Field::string("path", |h| &mut h.path),
            Field::optional_number("port", |h| &mut h.port),
            Field::duration("interval", |h| &mut h.interval),
            Field::duration("timeout", |h| &mut h.timeout),
            Field::string("hostname", |h| &mut h.hostname),
            Field::string_map("headers", |h| &mut h.headers),
        ]
    }
}

/// Sticky sessions through a cookie.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stickiness {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cookie_name: String,
    pub secure_cookie: bool,
    pub http_only_cookie: bool,
}

impl Schema for Stickiness {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::string("cookieName", |s| &mut s.cookie_name),
            Field::bool("secureCookie", |s| &mut s.secure_cookie),
            Field::bool("httpOnlyCookie", |s| &mut s.http_only_cookie),
        ]
    }
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}
