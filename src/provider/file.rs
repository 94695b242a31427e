//! Dynamic configuration read from a structured file.

use std::path::Path;

use crate::decode::{decode_file, field_names, populate, Decoded, LoadError};
use crate::dynamic::Configuration;

/// Load a TOML or YAML file holding `http` / `tcp` sections.
///
/// Other root sections are ignored. Keys the schema does not know and values
/// that cannot be coerced are reported next to the configuration.
pub fn load_file(path: &Path) -> Result<Decoded<Configuration>, LoadError> {
    let roots = field_names::<Configuration>();
    let node = decode_file(path, &roots)?;
    let decoded = populate::<Configuration>(&node);

    for key in &decoded.unsupported_keys {
        tracing::warn!(file = %path.display(), key = %key, "Ignoring unsupported key");
    }
    for error in &decoded.errors {
        tracing::warn!(file = %path.display(), path = %error.path, error = %error.message, "Ignoring invalid value");
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::{Middleware, Router, Server};
    use std::fs;
    use std::time::Duration;

    #[test]
    fn test_load_yaml_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic.yml");
        fs::write(
            &path,
            r#"
http:
  routers:
    web:
      rule: Host(`example.com`)
      service: web
      middlewares: [strip]
  middlewares:
    strip:
      stripPrefix:
        prefixes: ["/api", "/v1"]
  services:
    web:
      loadBalancer:
        passHostHeader: false
        healthCheck:
          path: /health
          interval: 10s
        servers:
          - url: http://10.0.0.1:80
          - url: http://10.0.0.2:80
tcp:
  routers:
    db:
      rule: HostSNI(`*`)
      service: db
providers:
  docker: {}
"#,
        )
        .unwrap();

        let decoded = load_file(&path).unwrap();
        assert!(decoded.errors.is_empty(), "{:?}", decoded.errors);
        assert!(decoded.unsupported_keys.is_empty());

        let config = decoded.value;
        let mut expected = Router::new("Host(`example.com`)", "web");
        expected.middlewares = vec!["strip".to_string()];
        assert_eq!(config.http.routers["web"], expected);
        assert_eq!(config.http.middlewares["strip"].kind(), "stripPrefix");
        assert!(matches!(&config.http.middlewares["strip"], Middleware::StripPrefix(s) if s.prefixes.len() == 2));

        let lb = &config.http.services["web"].load_balancer;
        assert!(!lb.pass_host_header);
        assert_eq!(lb.servers, vec![Server::new("http://10.0.0.1:80"), Server::new("http://10.0.0.2:80")]);
        assert_eq!(lb.health_check.as_ref().and_then(|h| h.interval), Some(Duration::from_secs(10)));
        assert_eq!(config.tcp.routers["db"].binding.service, "db");
    }

    #[test]
    fn test_unknown_keys_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic.toml");
        fs::write(
            &path,
            "[http.routers.web]\nrule = \"Host(`a`)\"\nservice = \"web\"\nweight = 3\n\n[http.services.web.loadBalancer]\npassHostHeader = \"maybe\"\n",
        )
        .unwrap();

        let decoded = load_file(&path).unwrap();
        assert_eq!(decoded.unsupported_keys, vec!["http.routers.web.weight".to_string()]);
        assert_eq!(decoded.errors.len(), 1);
        assert_eq!(decoded.errors[0].path, "http.services.web.loadBalancer.passHostHeader");
        assert_eq!(decoded.value.http.routers.len(), 1);
        assert!(decoded.value.http.services["web"].load_balancer.pass_host_header);
    }

    #[test]
    fn test_json_suffix_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic.json");
        fs::write(&path, "{}").unwrap();
        assert!(matches!(load_file(&path), Err(LoadError::UnsupportedExtension(_))));
    }
}
