//! End-to-end assembly of configurations from labelled instances.

use edge_router::dynamic::{
    HealthCheck, Middleware, Router, RouterTls, Server, TcpRouterTls, TcpServer,
};
use edge_router::{ConfigurationBuilder, Instance, ProviderConfig};
use std::time::Duration;

mod common;
use common::{builder, builder_with_rule, instance, labelled};

#[test]
fn test_default_rule_scenario() {
    let config = builder_with_rule("Host(`{{ .Name }}.foo.bar`)").build(&[instance("Test", "127.0.0.1")]);

    assert_eq!(config.http.routers.len(), 1);
    assert_eq!(config.http.routers["Test"], Router::new("Host(`Test.foo.bar`)", "Test"));
    assert_eq!(config.http.services.len(), 1);
    let lb = &config.http.services["Test"].load_balancer;
    assert_eq!(lb.servers, vec![Server::new("http://127.0.0.1:80")]);
    assert!(lb.pass_host_header);
    assert!(config.http.middlewares.is_empty());
    assert!(config.tcp.routers.is_empty());
    assert!(config.tcp.services.is_empty());
}

#[test]
fn test_two_instances_same_service() {
    let config = builder().build(&[instance("Test", "127.0.0.1"), instance("Test", "127.0.0.2")]);

    assert_eq!(config.http.routers["Test"], Router::new("Host(`Test.traefik.wtf`)", "Test"));
    assert_eq!(
        config.http.services["Test"].load_balancer.servers,
        vec![Server::new("http://127.0.0.1:80"), Server::new("http://127.0.0.2:80")]
    );
}

#[test]
fn test_conflicting_pass_host_header() {
    let config = builder().build(&[
        labelled(
            instance("Test", "127.0.0.1"),
            &[("traefik.http.services.Service1.loadbalancer.passhostheader", "true")],
        ),
        labelled(
            instance("Test", "127.0.0.2"),
            &[("traefik.http.services.Service1.loadbalancer.passhostheader", "false")],
        ),
    ]);

    assert!(!config.http.services.contains_key("Service1"));
    assert!(config.http.routers.is_empty());
}

#[test]
fn test_conflict_is_not_settled_by_majority() {
    let label = "traefik.http.services.Service1.loadbalancer.passhostheader";
    let config = builder().build(&[
        labelled(instance("Test", "127.0.0.1"), &[(label, "false")]),
        labelled(instance("Test", "127.0.0.2"), &[(label, "true")]),
        labelled(instance("Test", "127.0.0.3"), &[(label, "true")]),
    ]);

    assert!(config.http.services.is_empty());
    assert!(config.http.routers.is_empty());
}

#[test]
fn test_conflicting_middlewares_are_dropped() {
    let config = builder().build(&[
        labelled(
            instance("Test", "127.0.0.1"),
            &[("traefik.http.middlewares.Middleware1.maxconn.amount", "42")],
        ),
        labelled(
            instance("Test", "127.0.0.2"),
            &[("traefik.http.middlewares.Middleware1.maxconn.amount", "41")],
        ),
    ]);

    assert!(config.http.middlewares.is_empty());
    assert_eq!(config.http.services["Test"].load_balancer.servers.len(), 2);
    assert_eq!(config.http.routers.len(), 1);
}

#[test]
fn test_equal_middlewares_deduplicate() {
    let labels = [
        ("traefik.http.middlewares.Middleware1.basicauth.users", "test:xxx,test2:yyy"),
        ("traefik.http.routers.Router1.middlewares", "Middleware1"),
        ("traefik.http.routers.Router1.rule", "Host(`foo.bar`)"),
    ];
    let config = builder().build(&[
        labelled(instance("Test", "127.0.0.1"), &labels),
        labelled(instance("Test", "127.0.0.2"), &labels),
    ]);

    assert_eq!(config.http.middlewares.len(), 1);
    let Middleware::BasicAuth(auth) = &config.http.middlewares["Middleware1"] else {
        panic!("expected basicAuth");
    };
    assert_eq!(auth.users, vec!["test:xxx", "test2:yyy"]);

    let mut router = Router::new("Host(`foo.bar`)", "Test");
    router.middlewares = vec!["Middleware1".to_string()];
    assert_eq!(config.http.routers["Router1"], router);
}

#[test]
fn test_middleware_with_two_kinds_is_rejected() {
    let config = builder().build(&[labelled(
        instance("Test", "127.0.0.1"),
        &[
            ("traefik.http.middlewares.m.addprefix.prefix", "/api"),
            ("traefik.http.middlewares.m.stripprefix.prefixes", "/v1"),
        ],
    )]);

    assert!(config.http.middlewares.is_empty());
    assert_eq!(config.http.services.len(), 1);
}

#[test]
fn test_invalid_rule_template_keeps_service() {
    let config = builder_with_rule("Host(`{{ .Toto }}`)").build(&[instance("Test", "127.0.0.1")]);
    assert!(config.http.routers.is_empty());
    assert_eq!(config.http.services["Test"].load_balancer.servers, vec![Server::new("http://127.0.0.1:80")]);
}

#[test]
fn test_subdomain_rule_from_hierarchical_name() {
    let config = builder_with_rule(
        "Host(`{{ (.Name | splitList \"/\" | reverse | strsToItfs | join \".\") | trimSuffix \".\" }}.traefik.wtf`)",
    )
    .build(&[instance("/foo/bar", "127.0.0.1")]);

    assert_eq!(config.http.routers["foo-bar"].binding.rule, "Host(`bar.foo.traefik.wtf`)");
}

#[test]
fn test_rule_from_label_lookup() {
    let config = builder_with_rule("Host(`{{ index .Labels \"com.example.domain\" }}`)").build(&[labelled(
        instance("Test", "127.0.0.1"),
        &[("com.example.domain", "example.org")],
    )]);

    assert_eq!(config.http.routers["Test"].binding.rule, "Host(`example.org`)");
}

#[test]
fn test_router_referencing_foreign_service() {
    let config = builder().build(&[
        labelled(
            instance("front", "127.0.0.1"),
            &[
                ("traefik.http.routers.front.rule", "Host(`front`)"),
                ("traefik.http.routers.front.service", "back"),
            ],
        ),
        instance("back", "127.0.0.2"),
    ]);

    assert_eq!(config.http.routers["front"], Router::new("Host(`front`)", "back"));
    assert!(config.http.services.contains_key("back"));
    assert!(config.http.services.contains_key("front"));
}

#[test]
fn test_router_referencing_missing_service_is_dropped() {
    let config = builder().build(&[labelled(
        instance("Test", "127.0.0.1"),
        &[
            ("traefik.http.routers.r.rule", "Host(`r`)"),
            ("traefik.http.routers.r.service", "nowhere"),
        ],
    )]);

    assert!(config.http.routers.is_empty());
    assert!(config.http.services.contains_key("Test"));
}

#[test]
fn test_unsupported_and_malformed_labels_are_ignored() {
    let config = builder().build(&[labelled(
        instance("Test", "127.0.0.1"),
        &[
            ("traefik.wrong.label", "foo"),
            ("traefik.http.routers", "x"),
            ("traefik.http.services.Test.loadbalancer.bogus", "x"),
            ("other.prefix.label", "x"),
        ],
    )]);

    assert_eq!(config.http.services["Test"].load_balancer.servers.len(), 1);
    assert_eq!(config.http.routers["Test"].binding.rule, "Host(`Test.traefik.wtf`)");
}

#[test]
fn test_oversized_list_index_leaves_other_labels_in_cycle() {
    let config = builder().build(&[
        labelled(
            instance("web", "10.0.0.1"),
            &[
                ("traefik.http.services.s.loadbalancer.server[99999999999].port", "80"),
                ("traefik.http.services.s.loadbalancer.servers[4096].url", "http://10.0.0.9"),
                ("traefik.http.routers.web.rule", "Host(`web.example.com`)"),
                ("traefik.http.middlewares.m.addprefix.prefix", "/api"),
            ],
        ),
        instance("other", "10.0.0.2"),
    ]);

    assert!(!config.http.services.contains_key("s"));
    assert_eq!(config.http.routers["web"], Router::new("Host(`web.example.com`)", "web"));
    assert_eq!(config.http.services["web"].load_balancer.servers, vec![Server::new("http://10.0.0.1:80")]);
    assert!(matches!(config.http.middlewares["m"], Middleware::AddPrefix(_)));
    assert_eq!(config.http.routers["other"].binding.rule, "Host(`other.traefik.wtf`)");
    assert!(config.http.services.contains_key("other"));
}

#[test]
fn test_instance_without_port_contributes_nothing() {
    let config = builder().build(&[labelled(
        Instance::new("Test").with_address("bridge", "127.0.0.1"),
        &[("traefik.http.middlewares.Middleware1.addprefix.prefix", "/api")],
    )]);

    assert!(config.is_empty());
}

#[test]
fn test_port_and_network_labels() {
    let node = Instance::new("Test")
        .with_address("front", "10.0.0.1")
        .with_address("back", "10.0.0.2")
        .with_ports(&[80, 81]);

    let config = builder().build(&[labelled(
        node.clone(),
        &[
            ("traefik.network", "back"),
            ("traefik.http.services.Service1.loadbalancer.server.port", "index:1"),
        ],
    )]);
    assert_eq!(config.http.services["Service1"].load_balancer.servers, vec![Server::new("http://10.0.0.2:81")]);

    let config = builder().build(&[labelled(node, &[("traefik.network", "missing")])]);
    assert_eq!(config.http.services["Test"].load_balancer.servers, vec![Server::new("http://10.0.0.1:80")]);
}

#[test]
fn test_load_balancer_options_from_labels() {
    let config = builder().build(&[labelled(
        instance("Test", "127.0.0.1"),
        &[
            ("traefik.http.services.Service1.loadbalancer.healthcheck.path", "/health"),
            ("traefik.http.services.Service1.loadbalancer.healthcheck.interval", "10s"),
            ("traefik.http.services.Service1.loadbalancer.stickiness.cookiename", "sticky"),
            ("traefik.http.routers.Router1.rule", "Host(`foo.bar`)"),
            ("traefik.http.routers.Router1.tls.certresolver", "le"),
        ],
    )]);

    let lb = &config.http.services["Service1"].load_balancer;
    assert_eq!(
        lb.health_check,
        Some(HealthCheck {
            path: "/health".to_string(),
            interval: Some(Duration::from_secs(10)),
            ..Default::default()
        })
    );
    assert_eq!(lb.stickiness.as_ref().map(|s| s.cookie_name.as_str()), Some("sticky"));
    assert_eq!(
        config.http.routers["Router1"].tls,
        Some(RouterTls { cert_resolver: "le".to_string(), ..Default::default() })
    );
}

#[test]
fn test_tcp_router_scenario() {
    let config = builder().build(&[labelled(
        instance("Test", "127.0.0.1"),
        &[
            ("traefik.tcp.routers.foo.rule", "HostSNI(`foo.bar`)"),
            ("traefik.tcp.routers.foo.tls", "true"),
        ],
    )]);

    assert!(config.http.routers.is_empty());
    assert!(config.http.services.is_empty());
    let router = &config.tcp.routers["foo"];
    assert_eq!(router.binding.rule, "HostSNI(`foo.bar`)");
    assert_eq!(router.binding.service, "Test");
    assert_eq!(router.tls, Some(TcpRouterTls::default()));
    assert_eq!(config.tcp.services["Test"].load_balancer.servers, vec![TcpServer::new("127.0.0.1:80")]);
}

#[test]
fn test_tcp_services_union() {
    let labels = [
        ("traefik.tcp.routers.foo.rule", "HostSNI(`foo.bar`)"),
        ("traefik.tcp.services.foo.loadbalancer.server.port", "8080"),
    ];
    let config = builder().build(&[
        labelled(instance("Test", "127.0.0.1"), &labels),
        labelled(instance("Test", "127.0.0.2"), &labels),
    ]);

    assert_eq!(config.tcp.routers["foo"].binding.service, "foo");
    assert_eq!(
        config.tcp.services["foo"].load_balancer.servers,
        vec![TcpServer::new("127.0.0.1:8080"), TcpServer::new("127.0.0.2:8080")]
    );
}

#[test]
fn test_constraints_filter_instances() {
    let builder = ConfigurationBuilder::new(ProviderConfig {
        default_rule: common::TEST_RULE.to_string(),
        constraints: vec!["tag==public".parse().unwrap(), "tag!=canary".parse().unwrap()],
        ..Default::default()
    });

    let config = builder.build(&[
        labelled(instance("a", "10.0.0.1"), &[("traefik.tags", "public")]),
        labelled(instance("b", "10.0.0.2"), &[("traefik.tags", "public,canary")]),
        instance("c", "10.0.0.3"),
    ]);

    assert_eq!(config.http.services.keys().collect::<Vec<_>>(), vec!["a"]);
}

#[test]
fn test_output_serialises_deterministically() {
    let instances = vec![
        instance("zeta", "10.0.0.2"),
        labelled(instance("alpha", "10.0.0.1"), &[("traefik.http.middlewares.m.addprefix.prefix", "/a")]),
    ];
    let first = serde_json::to_string(&builder().build(&instances)).unwrap();
    let second = serde_json::to_string(&builder().build(&instances)).unwrap();
    assert_eq!(first, second);
    assert!(first.find("\"alpha\"").unwrap() < first.find("\"zeta\"").unwrap());
    assert!(first.contains("\"addPrefix\":{\"prefix\":\"/a\"}"));
}
