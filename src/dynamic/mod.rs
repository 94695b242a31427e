//! Dynamic routing configuration model.
//!
//! # Data Flow
//! ```text
//! label tree / file tree
//!     → decode::populate (field tables below)
//!     → Configuration { http, tcp }
//!     → provider::builder (merge across instances)
//!     → published to the serving layer
//! ```
//!
//! # Design Decisions
//! - Every map is always present, possibly empty
//! - Ordered maps so serialisation is deterministic
//! - Middlewares are a sum type: exactly one option per middleware

pub mod http;
pub mod middleware;
pub mod tcp;

use serde::Serialize;

use crate::decode::{Field, Schema};

pub use http::{
    HealthCheck, HttpConfiguration, LoadBalancer, RouteBinding, Router, RouterTls, Server, Service,
    Stickiness,
};
pub use middleware::{Middleware, MiddlewareOptions};
pub use tcp::{TcpConfiguration, TcpLoadBalancer, TcpRouter, TcpRouterTls, TcpServer, TcpService};

/// Root of the assembled routing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Configuration {
    pub http: HttpConfiguration,
    pub tcp: TcpConfiguration,
}

impl Schema for Configuration {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::nested("http", |c| &mut c.http),
            Field::nested("tcp", |c| &mut c.tcp),
        ]
    }
}

impl Configuration {
    /// True when no router, service or middleware is defined.
    pub fn is_empty(&self) -> bool {
        self.http.routers.is_empty()
            && self.http.services.is_empty()
            && self.http.middlewares.is_empty()
            && self.tcp.routers.is_empty()
            && self.tcp.services.is_empty()
    }
}

/// Serialises optional durations as `30s` / `250ms` / `15ns`.
pub(crate) mod duration_format {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&format(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn format(d: Duration) -> String {
        if d.subsec_nanos() == 0 {
            format!("{}s", d.as_secs())
        } else if d.subsec_nanos() % 1_000_000 == 0 {
            format!("{}ms", d.as_millis())
        } else {
            format!("{}ns", d.as_nanos())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode, populate};
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_empty_configuration_serialises_all_maps() {
        let out = serde_json::to_value(Configuration::default()).unwrap();
        assert_eq!(
            out,
            json!({
                "http": { "routers": {}, "middlewares": {}, "services": {} },
                "tcp": { "routers": {}, "services": {} }
            })
        );
    }

    #[test]
    fn test_decode_file_shaped_tree() {
        let raw = json!({
            "http": {
                "routers": {
                    "web": {
                        "rule": "Host(`example.com`)",
                        "service": "app",
                        "middlewares": ["auth"],
                        "entryPoints": ["websecure"],
                        "tls": {}
                    }
                },
                "services": {
                    "app": {
                        "loadBalancer": {
                            "servers": [{ "url": "http://10.0.0.1:80" }, { "url": "http://10.0.0.2:80" }],
                            "passHostHeader": false,
                            "healthCheck": { "path": "/health", "interval": "10s" }
                        }
                    }
                },
                "middlewares": {
                    "auth": { "basicAuth": { "users": ["test:hash"] } }
                }
            },
            "tcp": {
                "routers": { "db": { "rule": "HostSNI(`*`)", "service": "pg", "tls": { "passthrough": true } } },
                "services": { "pg": { "loadBalancer": { "servers": [{ "address": "10.0.0.3:5432" }] } } }
            }
        });

        let decoded = populate::<Configuration>(&decode(&raw, &[]));
        assert!(decoded.errors.is_empty(), "{:?}", decoded.errors);
        assert!(decoded.unsupported_keys.is_empty(), "{:?}", decoded.unsupported_keys);

        let config = decoded.value;
        let web = &config.http.routers["web"];
        assert_eq!(web.binding.rule, "Host(`example.com`)");
        assert_eq!(web.binding.entry_points, vec!["websecure"]);
        assert_eq!(web.middlewares, vec!["auth"]);
        assert_eq!(web.tls, Some(RouterTls::default()));

        let lb = &config.http.services["app"].load_balancer;
        assert_eq!(lb.servers, vec![Server::new("http://10.0.0.1:80"), Server::new("http://10.0.0.2:80")]);
        assert!(!lb.pass_host_header);
        let check = lb.health_check.as_ref().unwrap();
        assert_eq!(check.interval, Some(Duration::from_secs(10)));

        assert!(matches!(config.http.middlewares["auth"], Middleware::BasicAuth(_)));
        assert_eq!(config.tcp.routers["db"].tls.as_ref().map(|t| t.passthrough), Some(true));
        assert_eq!(config.tcp.services["pg"].load_balancer.servers, vec![TcpServer::new("10.0.0.3:5432")]);
    }

    #[test]
    fn test_duration_format() {
        assert_eq!(duration_format::format(Duration::from_secs(30)), "30s");
        assert_eq!(duration_format::format(Duration::from_millis(250)), "250ms");
        assert_eq!(duration_format::format(Duration::from_nanos(15)), "15ns");
    }
}
