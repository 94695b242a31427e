//! Address and port resolution for synthesized and labelled servers.

use std::net::Ipv6Addr;

use crate::labels::EndpointSelection;
use crate::provider::instance::Instance;

/// Error type for endpoint resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("no address found")]
    NoAddress,

    #[error("invalid IP address index {index}: {count} addresses available")]
    AddressIndex { index: usize, count: usize },

    #[error("no port found")]
    NoPort,

    #[error("port index {index} out of range: {count} ports available")]
    PortIndex { index: usize, count: usize },

    #[error("invalid port {value:?}: {reason}")]
    InvalidPort { value: String, reason: String },
}

/// Pick the address servers of `instance` are reached at.
///
/// Order: the selected network (label, then `default_network`), the
/// `ipAddressIdx` label, the first declared address.
pub fn resolve_host<'a>(
    instance: &'a Instance,
    selection: &EndpointSelection,
    default_network: &str,
) -> Result<&'a str, EndpointError> {
    let network = if selection.network.is_empty() {
        default_network
    } else {
        selection.network.as_str()
    };

    if !network.is_empty() {
        match instance.addresses.iter().find(|a| a.network == network) {
            Some(address) => return Ok(address.ip.as_str()),
            None => tracing::warn!(
                instance = %instance.name,
                network = %network,
                "Could not find network, defaulting to the first available address"
            ),
        }
    }

    if let Some(index) = selection.ip_address_idx {
        return instance
            .addresses
            .get(index)
            .map(|a| a.ip.as_str())
            .ok_or(EndpointError::AddressIndex { index, count: instance.addresses.len() });
    }

    instance
        .addresses
        .first()
        .map(|a| a.ip.as_str())
        .ok_or(EndpointError::NoAddress)
}

/// Resolve a server `port` value: empty, `index:N`, or a port number.
pub fn resolve_port(instance: &Instance, value: &str) -> Result<u16, EndpointError> {
    let value = value.trim();
    if value.is_empty() {
        return instance.ports.first().copied().ok_or(EndpointError::NoPort);
    }

    if let Some(raw) = value.strip_prefix("index:") {
        let index: usize = raw.parse().map_err(|e| EndpointError::InvalidPort {
            value: value.to_string(),
            reason: format!("bad index: {}", e),
        })?;
        return instance
            .ports
            .get(index)
            .copied()
            .ok_or(EndpointError::PortIndex { index, count: instance.ports.len() });
    }

    match value.parse::<u16>() {
        Ok(0) => Err(EndpointError::InvalidPort {
            value: value.to_string(),
            reason: "port must be greater than 0".to_string(),
        }),
        Ok(port) => Ok(port),
        Err(e) => Err(EndpointError::InvalidPort {
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// `host:port`, with IPv6 hosts bracketed.
pub fn host_port(host: &str, port: u16) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// URL of an HTTP server; `scheme` defaults to `http`.
pub fn http_url(scheme: &str, host: &str, port: u16) -> String {
    let scheme = if scheme.is_empty() { "http" } else { scheme };
    format!("{}://{}", scheme, host_port(host, port))
}
