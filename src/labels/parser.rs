//! Dotted label paths to untyped trees.
//!
//! # Responsibilities
//! - Keep only keys under the reserved prefix
//! - Route `<prefix>.<protocol>.<kind>.<entity>.<field...>` into the dynamic tree
//! - Route `<prefix>.<setting>` into the per-instance settings tree
//! - Classify everything else under the prefix as malformed
//!
//! # Design Decisions
//! - Protocol and kind tokens ignore case; entity names are kept verbatim
//! - A segment `name[N]` addresses element N of a list, N at most `MAX_LIST_INDEX`
//! - Malformed keys are reported, never fatal

use std::collections::BTreeMap;
use std::fmt;

use crate::decode::Node;

/// Largest list index a label may address. Lists are grown up to the index.
pub const MAX_LIST_INDEX: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Protocol {
    Http,
    Tcp,
}

impl Protocol {
    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("http") {
            Some(Protocol::Http)
        } else if token.eq_ignore_ascii_case("tcp") {
            Some(Protocol::Tcp)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Tcp => "tcp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Router,
    Service,
    Middleware,
}

impl EntityKind {
    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("routers") {
            Some(EntityKind::Router)
        } else if token.eq_ignore_ascii_case("services") {
            Some(EntityKind::Service)
        } else if token.eq_ignore_ascii_case("middlewares") {
            Some(EntityKind::Middleware)
        } else {
            None
        }
    }

    /// Section name in the configuration tree.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Router => "routers",
            EntityKind::Service => "services",
            EntityKind::Middleware => "middlewares",
        }
    }
}

/// An entity observed in an instance's labels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityRef {
    pub protocol: Protocol,
    pub kind: EntityKind,
    pub name: String,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.protocol.as_str(), self.kind.as_str(), self.name)
    }
}

/// Why a key under the prefix was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLabel {
    pub key: String,
    pub reason: &'static str,
}

/// Labels of one instance, split by destination.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTree {
    /// Per-instance settings (`<prefix>.enable`, `<prefix>.tags`, ...).
    pub instance: Node,
    /// `http` / `tcp` sections, shaped like a configuration file.
    pub dynamic: Node,
    /// Entities in first-seen order, without duplicates.
    pub entities: Vec<EntityRef>,
    pub malformed: Vec<MalformedLabel>,
}

/// Split `labels` into an instance settings tree and a dynamic configuration tree.
///
/// `instance_fields` lists the setting names accepted directly under the prefix.
pub fn parse_labels(
    labels: &BTreeMap<String, String>,
    prefix: &str,
    instance_fields: &[&str],
) -> LabelTree {
    let mut tree = LabelTree {
        instance: Node::branch(),
        dynamic: Node::branch(),
        entities: Vec::new(),
        malformed: Vec::new(),
    };

    for (key, value) in labels {
        let mut segments = key.split('.');
        match segments.next() {
            Some(first) if first.eq_ignore_ascii_case(prefix) => {}
            _ => continue,
        }
        let rest: Vec<&str> = segments.collect();

        if let Err(reason) = insert_label(&mut tree, &rest, value, instance_fields) {
            tree.malformed.push(MalformedLabel { key: key.clone(), reason });
        }
    }

    tree
}

fn insert_label(
    tree: &mut LabelTree,
    segments: &[&str],
    value: &str,
    instance_fields: &[&str],
) -> Result<(), &'static str> {
    let Some((&head, tail)) = segments.split_first() else {
        return Err("missing section after prefix");
    };

    if let Some(protocol) = Protocol::parse(head) {
        let [kind, name, fields @ ..] = tail else {
            return Err("expected <protocol>.<kind>.<name>.<field>");
        };
        let kind = EntityKind::parse(kind).ok_or("unknown entity kind")?;
        if protocol == Protocol::Tcp && kind == EntityKind::Middleware {
            return Err("tcp middlewares are not supported");
        }
        if name.is_empty() {
            return Err("empty entity name");
        }
        if fields.is_empty() {
            return Err("missing field path");
        }

        let parsed = parse_segments(fields)?;
        let mut node = tree
            .dynamic
            .entry(protocol.as_str())
            .entry(kind.as_str())
            .entry(name);
        for segment in &parsed {
            node = segment.descend(node);
        }
        *node = Node::Leaf(value.to_string());

        let entity = EntityRef { protocol, kind, name: name.to_string() };
        if !tree.entities.contains(&entity) {
            tree.entities.push(entity);
        }
        return Ok(());
    }

    if instance_fields.iter().any(|f| f.eq_ignore_ascii_case(head)) {
        let parsed = parse_segments(segments)?;
        let mut node = &mut tree.instance;
        for segment in &parsed {
            node = segment.descend(node);
        }
        *node = Node::Leaf(value.to_string());
        return Ok(());
    }

    Err("unknown section")
}

enum Segment<'a> {
    Name(&'a str),
    Element(&'a str, usize),
}

impl<'a> Segment<'a> {
    fn descend<'n>(&self, node: &'n mut Node) -> &'n mut Node {
        match self {
            Segment::Name(name) => node.entry(name),
            Segment::Element(name, index) => node.entry(name).element(*index),
        }
    }
}

fn parse_segments<'a>(raw: &[&'a str]) -> Result<Vec<Segment<'a>>, &'static str> {
    raw.iter().copied().map(parse_segment).collect()
}

fn parse_segment(raw: &str) -> Result<Segment<'_>, &'static str> {
    if raw.is_empty() {
        return Err("empty path segment");
    }
    match raw.strip_suffix(']').and_then(|s| s.split_once('[')) {
        Some((name, index)) if !name.is_empty() => match index.parse::<usize>() {
            Ok(index) if index > MAX_LIST_INDEX => Err("list index too large"),
            Ok(index) => Ok(Segment::Element(name, index)),
            Err(_) => Err("invalid list index"),
        },
        Some(_) => Err("missing name before list index"),
        None if raw.contains('[') || raw.contains(']') => Err("unbalanced list index"),
        None => Ok(Segment::Name(raw)),
    }
}
