//! Declared field tables for decode targets.
//!
//! Each target type lists its fields once: the name matched against tree
//! nodes, a kind tag, and a setter that writes a decoded node into the value.
//! Fields of embedded members are lifted into the parent table with
//! [`promote`], so they share the parent's name space.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::decode::node::Node;
use crate::decode::populate::{populate_into, Decoder};

/// Kind of value a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Number,
    Duration,
    String,
    StringList,
    StringMap,
    Struct,
    Map,
    List,
}

type Setter<T> = Box<dyn Fn(&mut T, &Node, &mut Decoder)>;

/// A decode target with a declared field table.
pub trait Schema: Default + 'static {
    /// Field table in declaration order, promoted members already flattened.
    fn fields() -> Vec<Field<Self>>;
}

/// One entry of a field table.
pub struct Field<T> {
    name: &'static str,
    alias: Option<&'static str>,
    kind: FieldKind,
    set: Setter<T>,
}

impl<T: 'static> Field<T> {
    /// Field name as declared.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fields that only accept a leaf.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Bool | FieldKind::Number | FieldKind::Duration | FieldKind::String
        )
    }

    /// Case-insensitive match against the name or its alias.
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.alias.is_some_and(|alias| alias.eq_ignore_ascii_case(name))
    }

    pub(crate) fn apply(&self, target: &mut T, node: &Node, decoder: &mut Decoder) {
        (self.set)(target, node, decoder)
    }

    /// Use another name for this field when it appears in a tree.
    pub fn with_alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    /// A field with a hand-written setter.
    pub fn custom(
        name: &'static str,
        kind: FieldKind,
        set: impl Fn(&mut T, &Node, &mut Decoder) + 'static,
    ) -> Self {
        Self { name, alias: None, kind, set: Box::new(set) }
    }

    pub fn bool(name: &'static str, get: fn(&mut T) -> &mut bool) -> Self {
        Self::custom(name, FieldKind::Bool, move |target, node, decoder| {
            if let Some(raw) = decoder.scalar(node) {
                match parse_bool(raw) {
                    Some(value) => *get(target) = value,
                    None => decoder.error(format!("invalid boolean {:?}", raw)),
                }
            }
        })
    }

    pub fn string(name: &'static str, get: fn(&mut T) -> &mut String) -> Self {
        Self::custom(name, FieldKind::String, move |target, node, decoder| {
            if let Some(raw) = decoder.scalar(node) {
                *get(target) = raw.to_string();
            }
        })
    }

    pub fn number<N>(name: &'static str, get: fn(&mut T) -> &mut N) -> Self
    where
        N: FromStr + 'static,
        N::Err: Display,
    {
        Self::custom(name, FieldKind::Number, move |target, node, decoder| {
            if let Some(raw) = decoder.scalar(node) {
                match raw.trim().parse::<N>() {
                    Ok(value) => *get(target) = value,
                    Err(e) => decoder.error(format!("invalid number {:?}: {}", raw, e)),
                }
            }
        })
    }

    pub fn optional_number<N>(name: &'static str, get: fn(&mut T) -> &mut Option<N>) -> Self
    where
        N: FromStr + 'static,
        N::Err: Display,
    {
        Self::custom(name, FieldKind::Number, move |target, node, decoder| {
            if let Some(raw) = decoder.scalar(node) {
                match raw.trim().parse::<N>() {
                    Ok(value) => *get(target) = Some(value),
                    Err(e) => decoder.error(format!("invalid number {:?}: {}", raw, e)),
                }
            }
        })
    }

    pub fn duration(name: &'static str, get: fn(&mut T) -> &mut Option<Duration>) -> Self {
        Self::custom(name, FieldKind::Duration, move |target, node, decoder| {
            if let Some(raw) = decoder.scalar(node) {
                match parse_duration(raw) {
                    Ok(value) => *get(target) = Some(value),
                    Err(e) => decoder.error(e),
                }
            }
        })
    }

    /// A comma separated leaf or an indexed branch of leaves.
    pub fn string_list(name: &'static str, get: fn(&mut T) -> &mut Vec<String>) -> Self {
        Self::custom(name, FieldKind::StringList, move |target, node, decoder| match node {
            Node::Leaf(raw) if raw.is_empty() => {}
            Node::Leaf(raw) => {
                *get(target) = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
            Node::Indexed(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    decoder.within(&format!("[{}]", i), |decoder| {
                        if let Some(raw) = decoder.scalar(item) {
                            values.push(raw.to_string());
                        }
                    });
                }
                *get(target) = values;
            }
            Node::Branch(_) => decoder.error("expected a list, found a section"),
        })
    }

    /// Section of string values keyed verbatim.
    pub fn string_map(
        name: &'static str,
        get: fn(&mut T) -> &mut BTreeMap<String, String>,
    ) -> Self {
        Self::custom(name, FieldKind::StringMap, move |target, node, decoder| {
            if !decoder.expect_section(node) {
                return;
            }
            for (key, child) in node.children() {
                decoder.within(key, |decoder| {
                    if let Some(raw) = decoder.scalar(child) {
                        get(target).insert(key.clone(), raw.to_string());
                    }
                });
            }
        })
    }

    pub fn nested<U: Schema>(name: &'static str, get: fn(&mut T) -> &mut U) -> Self {
        Self::custom(name, FieldKind::Struct, move |target, node, decoder| {
            populate_into(node, get(target), decoder)
        })
    }

    /// An optional section. A `true` leaf enables it with defaults, `false` removes it.
    pub fn optional<U: Schema>(name: &'static str, get: fn(&mut T) -> &mut Option<U>) -> Self {
        Self::custom(name, FieldKind::Struct, move |target, node, decoder| match node {
            Node::Leaf(raw) if raw.is_empty() => {}
            Node::Leaf(raw) => match parse_bool(raw) {
                Some(true) => {
                    get(target).get_or_insert_with(U::default);
                }
                Some(false) => *get(target) = None,
                None => decoder.error(format!("expected a section or a boolean, found {:?}", raw)),
            },
            _ => populate_into(node, get(target).get_or_insert_with(U::default), decoder),
        })
    }

    /// Named entries, keys kept verbatim.
    pub fn map<U: Schema>(name: &'static str, get: fn(&mut T) -> &mut BTreeMap<String, U>) -> Self {
        Self::custom(name, FieldKind::Map, move |target, node, decoder| {
            if !decoder.expect_section(node) {
                return;
            }
            for (key, child) in node.children() {
                decoder.within(key, |decoder| {
                    let entry = get(target).entry(key.clone()).or_default();
                    populate_into(child, entry, decoder);
                });
            }
        })
    }

    /// A list of sections. A single section is read as a one element list.
    pub fn list<U: Schema>(name: &'static str, get: fn(&mut T) -> &mut Vec<U>) -> Self {
        Self::custom(name, FieldKind::List, move |target, node, decoder| match node {
            Node::Leaf(raw) if raw.is_empty() => {}
            Node::Leaf(_) => decoder.error("expected a list, found a value"),
            Node::Indexed(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    decoder.within(&format!("[{}]", i), |decoder| {
                        let mut value = U::default();
                        populate_into(item, &mut value, decoder);
                        values.push(value);
                    });
                }
                *get(target) = values;
            }
            Node::Branch(_) => {
                let list = get(target);
                if list.is_empty() {
                    list.push(U::default());
                }
                populate_into(node, &mut list[0], decoder);
            }
        })
    }
}

/// Lift the fields of an embedded member into the parent's table.
pub fn promote<T: 'static, U: Schema>(get: fn(&mut T) -> &mut U) -> Vec<Field<T>> {
    U::fields()
        .into_iter()
        .map(|inner| Field {
            name: inner.name,
            alias: inner.alias,
            kind: inner.kind,
            set: Box::new(move |target: &mut T, node: &Node, decoder: &mut Decoder| {
                inner.apply(get(target), node, decoder)
            }),
        })
        .collect()
}

/// Flattened field names of a schema, without duplicates, in declaration order.
pub fn field_names<T: Schema>() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for field in T::fields() {
        if !names.iter().any(|n| n.eq_ignore_ascii_case(field.name)) {
            names.push(field.name);
        }
    }
    names
}

/// Case-insensitive `true`/`false`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse a duration such as `10s`, `1m30s`, `250ms` or a bare number of seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).map_err(|_| format!("invalid duration {:?}", raw));
    }

    let mut total = Duration::ZERO;
    let mut rest = raw;
    if rest.is_empty() {
        return Err("empty duration".to_string());
    }
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration {:?}", raw))?;
        if digits == 0 {
            return Err(format!("invalid duration {:?}", raw));
        }
        let value: f64 = rest[..digits]
            .parse()
            .map_err(|_| format!("invalid duration {:?}", raw))?;
        rest = &rest[digits..];
        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            unit => return Err(format!("unknown unit {:?} in duration {:?}", unit, raw)),
        };
        total += Duration::from_nanos((value * nanos_per_unit).round() as u64);
        rest = &rest[unit_len..];
    }
    Ok(total)
}
