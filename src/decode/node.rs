//! Untyped configuration tree.
//!
//! # Responsibilities
//! - Represent decoded input as a tagged tree (leaf, named branch, indexed branch)
//! - Convert parsed file content (`serde_json::Value`) into that tree
//! - Scope the root to a set of section names
//!
//! # Design Decisions
//! - Scalars are kept as strings; typing happens in `populate`
//! - Child order is the input order
//! - Null values become empty leaves, which `populate` treats as absent

use serde_json::Value;

/// One element of an untyped configuration tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A scalar value.
    Leaf(String),
    /// Named children, in input order.
    Branch(Vec<(String, Node)>),
    /// Children addressed by position.
    Indexed(Vec<Node>),
}

impl Node {
    /// An empty named branch.
    pub fn branch() -> Self {
        Node::Branch(Vec::new())
    }

    /// Look up a named child, ignoring ASCII case.
    pub fn child(&self, name: &str) -> Option<&Node> {
        match self {
            Node::Branch(children) => children
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, node)| node),
            _ => None,
        }
    }

    /// Named children, or an empty slice for leaves and indexed branches.
    pub fn children(&self) -> &[(String, Node)] {
        match self {
            Node::Branch(children) => children,
            _ => &[],
        }
    }

    /// The scalar value of a leaf.
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Node::Leaf(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the child named `name` (exact match), creating an empty branch if missing.
    ///
    /// A leaf is replaced by an empty branch so that deeper paths win over a
    /// shorter path that ended on the same segment.
    pub fn entry(&mut self, name: &str) -> &mut Node {
        if !matches!(self, Node::Branch(_)) {
            *self = Node::branch();
        }
        let Node::Branch(children) = self else {
            unreachable!("node was just turned into a branch")
        };
        let pos = match children.iter().position(|(key, _)| key == name) {
            Some(pos) => pos,
            None => {
                children.push((name.to_string(), Node::branch()));
                children.len() - 1
            }
        };
        &mut children[pos].1
    }

    /// Returns the element at `index`, growing the indexed branch with empty branches.
    pub fn element(&mut self, index: usize) -> &mut Node {
        if !matches!(self, Node::Indexed(_)) {
            *self = Node::Indexed(Vec::new());
        }
        let Node::Indexed(items) = self else {
            unreachable!("node was just turned into an indexed branch")
        };
        if items.len() <= index {
            items.resize(index + 1, Node::branch());
        }
        &mut items[index]
    }
}

/// Convert a parsed untyped value into a [`Node`] tree.
///
/// When `filters` is not empty, only root children whose name matches one of
/// them (ignoring ASCII case) are kept.
pub fn decode(raw: &Value, filters: &[&str]) -> Node {
    match raw {
        Value::Object(map) => Node::Branch(
            map.iter()
                .filter(|(key, _)| {
                    filters.is_empty() || filters.iter().any(|f| f.eq_ignore_ascii_case(key))
                })
                .map(|(key, value)| (key.clone(), decode(value, &[])))
                .collect(),
        ),
        other => decode_value(other),
    }
}

fn decode_value(raw: &Value) -> Node {
    match raw {
        Value::Object(_) => decode(raw, &[]),
        Value::Array(items) => Node::Indexed(items.iter().map(decode_value).collect()),
        Value::String(s) => Node::Leaf(s.clone()),
        Value::Bool(b) => Node::Leaf(b.to_string()),
        Value::Number(n) => Node::Leaf(n.to_string()),
        Value::Null => Node::Leaf(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_nested_value() {
        let raw = json!({
            "http": {
                "routers": { "web": { "rule": "Host(`a`)", "priority": 3 } },
                "services": { "s": { "loadBalancer": { "servers": [ { "url": "http://a" } ] } } }
            }
        });

        let node = decode(&raw, &[]);
        let web = node.child("http").and_then(|n| n.child("routers")).and_then(|n| n.child("web")).unwrap();
        assert_eq!(web.child("rule").and_then(Node::as_leaf), Some("Host(`a`)"));
        assert_eq!(web.child("priority").and_then(Node::as_leaf), Some("3"));

        let servers = node
            .child("http")
            .and_then(|n| n.child("services"))
            .and_then(|n| n.child("s"))
            .and_then(|n| n.child("LOADBALANCER"))
            .and_then(|n| n.child("servers"))
            .unwrap();
        match servers {
            Node::Indexed(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].child("url").and_then(Node::as_leaf), Some("http://a"));
            }
            other => panic!("expected indexed branch, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_filters_root_only() {
        let raw = json!({
            "http": { "tcp": { "x": "1" } },
            "tcp": {},
            "log": { "level": "debug" }
        });

        let node = decode(&raw, &["HTTP", "tcp"]);
        let names: Vec<&str> = node.children().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["http", "tcp"]);
        // Nested names are never filtered.
        assert!(node.child("http").and_then(|n| n.child("tcp")).is_some());
    }

    #[test]
    fn test_null_and_scalars_become_leaves() {
        let raw = json!({ "a": null, "b": true, "c": 1.5 });
        let node = decode(&raw, &[]);
        assert_eq!(node.child("a"), Some(&Node::Leaf(String::new())));
        assert_eq!(node.child("b"), Some(&Node::Leaf("true".into())));
        assert_eq!(node.child("c"), Some(&Node::Leaf("1.5".into())));
    }

    #[test]
    fn test_entry_and_element_build_paths() {
        let mut root = Node::branch();
        *root.entry("a").entry("b") = Node::Leaf("1".into());
        *root.entry("a").entry("list").element(1).entry("x") = Node::Leaf("2".into());

        let list = root.child("a").and_then(|n| n.child("list")).unwrap();
        match list {
            Node::Indexed(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0], Node::branch());
                assert_eq!(items[1].child("x").and_then(Node::as_leaf), Some("2"));
            }
            other => panic!("expected indexed branch, got {:?}", other),
        }
    }
}
