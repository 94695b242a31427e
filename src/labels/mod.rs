//! Instance labels.
//!
//! # Data Flow
//! ```text
//! instance labels (flat, dotted)
//!     → parser.rs (split by prefix / protocol / kind / entity)
//!     → decode::populate (InstanceConfig + Configuration schemas)
//!     → InstanceLabels (typed, with unsupported keys and field errors)
//! ```

pub mod parser;

use std::collections::BTreeMap;

use crate::decode::{field_names, populate, populate_from, promote, Field, FieldError, Schema};
use crate::dynamic::Configuration;

pub use parser::{parse_labels, EntityKind, EntityRef, LabelTree, MalformedLabel, Protocol};

/// Provider settings an instance may override through its own labels.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceConfig {
    pub enable: bool,
    pub tags: Vec<String>,
    pub endpoint: EndpointSelection,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self::exposed(true)
    }
}

impl InstanceConfig {
    pub fn exposed(enable: bool) -> Self {
        Self {
            enable,
            tags: Vec::new(),
            endpoint: EndpointSelection::default(),
        }
    }
}

impl Schema for InstanceConfig {
    fn fields() -> Vec<Field<Self>> {
        let mut fields = vec![
            Field::bool("enable", |c: &mut InstanceConfig| &mut c.enable),
            Field::string_list("tags", |c: &mut InstanceConfig| &mut c.tags),
        ];
        fields.extend(promote(|c: &mut InstanceConfig| &mut c.endpoint));
        fields
    }
}

/// Which of the instance's addresses to route to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointSelection {
    pub network: String,
    pub ip_address_idx: Option<usize>,
}

impl Schema for EndpointSelection {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::string("network", |e| &mut e.network),
            Field::optional_number("ipAddressIdx", |e| &mut e.ip_address_idx),
        ]
    }
}

/// Everything decoded from one instance's labels.
#[derive(Debug, Clone)]
pub struct InstanceLabels {
    pub settings: InstanceConfig,
    pub configuration: Configuration,
    pub entities: Vec<EntityRef>,
    /// Full label keys that match no declared field.
    pub unsupported: Vec<String>,
    pub errors: Vec<FieldError>,
    pub malformed: Vec<MalformedLabel>,
}

impl InstanceLabels {
    pub fn declares(&self, protocol: Protocol, kind: EntityKind) -> bool {
        self.entities.iter().any(|e| e.protocol == protocol && e.kind == kind)
    }

    pub fn declares_protocol(&self, protocol: Protocol) -> bool {
        self.entities.iter().any(|e| e.protocol == protocol)
    }
}

/// Decode the labels of one instance under `prefix`.
///
/// `exposed_by_default` is the value of `enable` when the instance does not set it.
pub fn decode_labels(
    labels: &BTreeMap<String, String>,
    prefix: &str,
    exposed_by_default: bool,
) -> InstanceLabels {
    let instance_fields = field_names::<InstanceConfig>();
    let tree = parse_labels(labels, prefix, &instance_fields);

    let settings = populate_from(&tree.instance, InstanceConfig::exposed(exposed_by_default));
    let dynamic = populate::<Configuration>(&tree.dynamic);

    let qualify = |path: String| format!("{}.{}", prefix, path);
    let unsupported = settings
        .unsupported_keys
        .into_iter()
        .chain(dynamic.unsupported_keys)
        .map(qualify)
        .collect();
    let errors = settings
        .errors
        .into_iter()
        .chain(dynamic.errors)
        .map(|e| FieldError { path: qualify(e.path), message: e.message })
        .collect();

    InstanceLabels {
        settings: settings.value,
        configuration: dynamic.value,
        entities: tree.entities,
        unsupported,
        errors,
        malformed: tree.malformed,
    }
}
