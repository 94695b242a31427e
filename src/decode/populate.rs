//! Mapping of untyped trees onto declared schemas.
//!
//! # Responsibilities
//! - Match node names against field tables, ignoring case
//! - Coerce leaves to field types
//! - Collect unsupported keys and field errors with their paths
//!
//! # Design Decisions
//! - Never fatal: a bad field is reported and skipped, siblings still decode
//! - Empty leaves mean "absent" and keep the schema default
//! - Paths are dotted, list elements rendered as `[i]`

use crate::decode::node::Node;
use crate::decode::schema::Schema;

/// A value that could not be coerced to its declared field type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {message}")]
pub struct FieldError {
    /// Dotted path of the offending node.
    pub path: String,
    pub message: String,
}

/// Result of decoding a tree onto a schema.
#[derive(Debug, Clone, Default)]
pub struct Decoded<T> {
    pub value: T,
    /// Paths of nodes that match no declared field.
    pub unsupported_keys: Vec<String>,
    pub errors: Vec<FieldError>,
}

/// Walk state shared across one decode call.
#[derive(Debug, Default)]
pub struct Decoder {
    path: Vec<String>,
    unsupported: Vec<String>,
    errors: Vec<FieldError>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` one segment deeper in the tree.
    pub fn within<R>(&mut self, segment: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(segment.to_string());
        let result = f(self);
        self.path.pop();
        result
    }

    /// Current dotted path.
    pub fn path(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            if !out.is_empty() && !segment.starts_with('[') {
                out.push('.');
            }
            out.push_str(segment);
        }
        out
    }

    /// Record a field error at the current path.
    pub fn error(&mut self, message: impl Into<String>) {
        let path = self.path();
        self.errors.push(FieldError { path, message: message.into() });
    }

    fn unsupported(&mut self, name: &str) {
        let path = self.within(name, |d| d.path());
        self.unsupported.push(path);
    }

    /// The value of a non-empty leaf. Sections are reported as errors.
    pub fn scalar<'n>(&mut self, node: &'n Node) -> Option<&'n str> {
        match node {
            Node::Leaf(value) if value.is_empty() => None,
            Node::Leaf(value) => Some(value),
            Node::Branch(_) => {
                self.error("expected a value, found a section");
                None
            }
            Node::Indexed(_) => {
                self.error("expected a value, found a list");
                None
            }
        }
    }

    /// True when `node` is a named branch. Empty leaves are silently absent.
    pub fn expect_section(&mut self, node: &Node) -> bool {
        match node {
            Node::Branch(_) => true,
            Node::Leaf(value) if value.is_empty() => false,
            Node::Leaf(_) => {
                self.error("expected a section, found a value");
                false
            }
            Node::Indexed(_) => {
                self.error("expected a section, found a list");
                false
            }
        }
    }

    /// Consume the walk state, attaching the collected reports to `value`.
    pub fn finish<T>(self, value: T) -> Decoded<T> {
        Decoded {
            value,
            unsupported_keys: self.unsupported,
            errors: self.errors,
        }
    }
}

/// Decode `node` onto a default value of `T`.
pub fn populate<T: Schema>(node: &Node) -> Decoded<T> {
    populate_from(node, T::default())
}

/// Decode `node` on top of an initial value.
pub fn populate_from<T: Schema>(node: &Node, mut value: T) -> Decoded<T> {
    let mut decoder = Decoder::new();
    populate_into(node, &mut value, &mut decoder);
    decoder.finish(value)
}

/// Decode `node` into `target`, reporting through `decoder`.
pub fn populate_into<T: Schema>(node: &Node, target: &mut T, decoder: &mut Decoder) {
    if !decoder.expect_section(node) {
        return;
    }

    let fields = T::fields();
    for (name, child) in node.children() {
        match fields.iter().find(|field| field.matches(name)) {
            Some(field) => decoder.within(name, |decoder| {
                if field.is_scalar() && !matches!(child, Node::Leaf(_)) {
                    decoder.error("expected a value, found a section");
                    return;
                }
                field.apply(target, child, decoder)
            }),
            None => decoder.unsupported(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::schema::{promote, Field};
    use std::collections::BTreeMap;
    use std::time::Duration;

    #[derive(Debug, Default, PartialEq)]
    struct Check {
        interval: Option<Duration>,
        path: String,
    }

    impl Schema for Check {
        fn fields() -> Vec<Field<Self>> {
            vec![
                Field::duration("interval", |c| &mut c.interval),
                Field::string("path", |c| &mut c.path),
            ]
        }
    }

    #[derive(Debug, PartialEq)]
    struct Common {
        enabled: bool,
        weight: u32,
    }

    impl Default for Common {
        fn default() -> Self {
            Self { enabled: true, weight: 1 }
        }
    }

    impl Schema for Common {
        fn fields() -> Vec<Field<Self>> {
            vec![
                Field::bool("enabled", |c| &mut c.enabled),
                Field::number("weight", |c| &mut c.weight),
            ]
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Target {
        common: Common,
        hosts: Vec<String>,
        check: Option<Check>,
        entries: BTreeMap<String, Check>,
        headers: BTreeMap<String, String>,
    }

    impl Schema for Target {
        fn fields() -> Vec<Field<Self>> {
            let mut fields = promote(|t: &mut Target| &mut t.common);
            fields.extend(vec![
                Field::string_list("hosts", |t: &mut Target| &mut t.hosts),
                Field::optional("healthCheck", |t: &mut Target| &mut t.check),
                Field::map("entries", |t: &mut Target| &mut t.entries),
                Field::string_map("headers", |t: &mut Target| &mut t.headers),
            ]);
            fields
        }
    }

    fn leaf(v: &str) -> Node {
        Node::Leaf(v.to_string())
    }

    fn branch(children: Vec<(&str, Node)>) -> Node {
        Node::Branch(children.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn test_names_match_case_insensitively_and_promoted_fields_flatten() {
        let node = branch(vec![
            ("ENABLED", leaf("False")),
            ("Weight", leaf("7")),
            ("HealthCheck", branch(vec![("Interval", leaf("30s"))])),
        ]);

        let decoded = populate::<Target>(&node);
        assert!(decoded.errors.is_empty());
        assert!(decoded.unsupported_keys.is_empty());
        assert!(!decoded.value.common.enabled);
        assert_eq!(decoded.value.common.weight, 7);
        assert_eq!(
            decoded.value.check,
            Some(Check { interval: Some(Duration::from_secs(30)), path: String::new() })
        );
    }

    #[test]
    fn test_unknown_names_are_reported_not_fatal() {
        let node = branch(vec![
            ("bogus", leaf("1")),
            ("entries", branch(vec![("a", branch(vec![("nope", leaf("x")), ("path", leaf("/p"))]))])),
        ]);

        let decoded = populate::<Target>(&node);
        assert_eq!(decoded.unsupported_keys, vec!["bogus", "entries.a.nope"]);
        assert_eq!(decoded.value.entries["a"].path, "/p");
    }

    #[test]
    fn test_empty_string_keeps_default() {
        let node = branch(vec![("enabled", leaf("")), ("weight", leaf(""))]);
        let decoded = populate::<Target>(&node);
        assert!(decoded.errors.is_empty());
        assert_eq!(decoded.value.common, Common::default());
    }

    #[test]
    fn test_coercion_error_does_not_abort_siblings() {
        let node = branch(vec![
            ("weight", leaf("heavy")),
            ("enabled", leaf("maybe")),
            ("hosts", leaf("a.com, b.com")),
        ]);

        let decoded = populate::<Target>(&node);
        let paths: Vec<&str> = decoded.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["weight", "enabled"]);
        assert_eq!(decoded.value.common, Common::default());
        assert_eq!(decoded.value.hosts, vec!["a.com", "b.com"]);
    }

    #[test]
    fn test_optional_section_from_boolean_leaf() {
        let on = populate::<Target>(&branch(vec![("healthcheck", leaf("true"))]));
        assert_eq!(on.value.check, Some(Check::default()));

        let off = populate::<Target>(&branch(vec![("healthcheck", leaf("false"))]));
        assert_eq!(off.value.check, None);
    }

    #[test]
    fn test_indexed_list_and_string_map() {
        let node = branch(vec![
            ("hosts", Node::Indexed(vec![leaf("a"), leaf("b")])),
            ("headers", branch(vec![("X-Env", leaf("prod"))])),
        ]);

        let decoded = populate::<Target>(&node);
        assert_eq!(decoded.value.hosts, vec!["a", "b"]);
        assert_eq!(decoded.value.headers.get("X-Env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn test_section_given_for_scalar_field() {
        let node = branch(vec![("weight", branch(vec![("x", leaf("1"))]))]);
        let decoded = populate::<Target>(&node);
        assert_eq!(decoded.errors.len(), 1);
        assert_eq!(decoded.errors[0].path, "weight");
        assert_eq!(decoded.errors[0].to_string(), "weight: expected a value, found a section");
    }
}
