//! The files under `demos/` load and build as documented.

use std::path::PathBuf;

use edge_router::config::load_settings;
use edge_router::dynamic::{Middleware, Server, TcpServer};
use edge_router::provider::{load_file, load_snapshot};
use edge_router::ConfigurationBuilder;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

#[test]
fn test_demo_snapshot_builds() {
    let settings = load_settings(&demo("settings.toml")).unwrap();
    let instances = load_snapshot(&demo("instances.yaml")).unwrap();
    let config = ConfigurationBuilder::new(settings.provider).build(&instances);

    let shop = &config.http.routers["shop"];
    assert_eq!(shop.binding.service, "shop-web");
    assert_eq!(shop.middlewares, vec!["shop-strip"]);
    assert!(matches!(config.http.middlewares["shop-strip"], Middleware::StripPrefix(_)));
    assert_eq!(
        config.http.services["shop-web"].load_balancer.servers,
        vec![Server::new("http://10.0.1.10:8080"), Server::new("http://10.0.1.11:8080")]
    );

    assert_eq!(config.tcp.routers["db"].binding.service, "postgres");
    assert!(config.tcp.routers["db"].tls.as_ref().is_some_and(|tls| tls.passthrough));
    assert_eq!(config.tcp.services["postgres"].load_balancer.servers, vec![TcpServer::new("10.0.2.20:5432")]);

    assert!(!config.http.services.contains_key("metrics"));
    assert!(!config.http.services.contains_key("batch"));
}

#[test]
fn test_demo_dynamic_file_decodes() {
    let decoded = load_file(&demo("dynamic.yaml")).unwrap();
    assert!(decoded.errors.is_empty());
    assert!(decoded.unsupported_keys.is_empty());
    assert!(matches!(decoded.value.http.middlewares["api-ratelimit"], Middleware::RateLimit(_)));
    assert_eq!(decoded.value.http.services["api"].load_balancer.servers.len(), 2);
}
