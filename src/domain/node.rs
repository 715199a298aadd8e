//! Configuration tree node
//!
//! A [`ConfigTree`] is either a leaf holding an opaque [`Value`] or a branch
//! holding keyed children. Children are held through [`SharedNode`] handles:
//! merge shares subtrees instead of deep-copying them, and every mutation
//! goes through [`Rc::make_mut`], so a shared subtree is copied on its first
//! write and the other owner never observes the change.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{instrument, trace};

use super::path::split_first;
use super::value::{from_toml, Value};

/// Shared handle to a child node.
pub type SharedNode = Rc<ConfigTree>;

/// Node of a hierarchical configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigTree {
    /// Scalar, array or any other opaque value. `Value::Null` is the empty leaf.
    Leaf(Value),
    /// Keyed children. Keys never contain the path separator.
    Branch(BTreeMap<String, SharedNode>),
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigTree {
    /// Empty leaf.
    pub fn new() -> Self {
        ConfigTree::Leaf(Value::Null)
    }

    /// Leaf holding `value` verbatim, even if it is an object.
    pub fn leaf(value: impl Into<Value>) -> Self {
        ConfigTree::Leaf(value.into())
    }

    /// Build a tree from a dynamic value.
    ///
    /// Objects become branches, anything else becomes a leaf. Object keys are
    /// inserted through [`ConfigTree::set`], so a key containing the separator
    /// is split into nested nodes: `{"a.b": 5}` yields `{"a": {"b": 5}}`.
    #[instrument(level = "trace", skip_all)]
    pub fn from_value(value: Value) -> Self {
        let mut node = Self::new();
        node.set_value(value);
        node
    }

    /// Replace this node's content with `value`.
    ///
    /// Prior value and children are dropped unconditionally, even when
    /// `value` is null.
    pub fn set_value(&mut self, value: Value) {
        self.clear();
        match value {
            Value::Object(map) => {
                let mut branch = ConfigTree::Branch(BTreeMap::new());
                for (key, child) in map {
                    branch.set(&key, Some(ConfigTree::from_value(child)));
                }
                *self = branch;
            }
            other => *self = ConfigTree::Leaf(other),
        }
    }

    /// Serialize the subtree back to a dynamic value.
    ///
    /// Leaves return their value (null for an empty leaf), branches a freshly
    /// built object.
    pub fn to_value(&self) -> Value {
        match self {
            ConfigTree::Leaf(value) => value.clone(),
            ConfigTree::Branch(children) => Value::Object(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_value()))
                    .collect(),
            ),
        }
    }

    /// Drop value and children, leaving an empty leaf.
    pub fn clear(&mut self) {
        *self = ConfigTree::new();
    }

    /// The leaf value, `None` for branches.
    pub fn value(&self) -> Option<&Value> {
        match self {
            ConfigTree::Leaf(value) => Some(value),
            ConfigTree::Branch(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ConfigTree::Leaf(_))
    }

    /// True for a null leaf and for a branch without children.
    ///
    /// Both count as uninitialized: merge lets them adopt any incoming shape.
    pub fn is_empty(&self) -> bool {
        match self {
            ConfigTree::Leaf(value) => value.is_null(),
            ConfigTree::Branch(children) => children.is_empty(),
        }
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        match self {
            ConfigTree::Leaf(_) => 0,
            ConfigTree::Branch(children) => children.len(),
        }
    }

    /// Keys of the direct children, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.children().map(|(key, _)| key)
    }

    /// Direct children, sorted by key.
    pub fn children(&self) -> impl Iterator<Item = (&str, &ConfigTree)> {
        let children = match self {
            ConfigTree::Leaf(_) => None,
            ConfigTree::Branch(children) => Some(children),
        };
        children
            .into_iter()
            .flatten()
            .map(|(key, child)| (key.as_str(), child.as_ref()))
    }

    /// Look up the node at a dotted path.
    ///
    /// `None` if any segment is missing or the walk hits a leaf.
    pub fn get(&self, path: &str) -> Option<&ConfigTree> {
        let ConfigTree::Branch(children) = self else {
            return None;
        };
        let (key, rest) = split_first(path);
        let child = children.get(key)?;
        match rest {
            None => Some(child.as_ref()),
            Some(rest) => child.get(rest),
        }
    }

    /// Shared handle to the node at a dotted path.
    pub fn get_shared(&self, path: &str) -> Option<SharedNode> {
        match split_first(path) {
            (key, None) => match self {
                ConfigTree::Branch(children) => children.get(key).cloned(),
                ConfigTree::Leaf(_) => None,
            },
            (key, Some(rest)) => self.get(key)?.get_shared(rest),
        }
    }

    /// Mutable access to the node at a dotted path.
    ///
    /// Shared nodes along the path are copied before being handed out.
    pub fn get_mut(&mut self, path: &str) -> Option<&mut ConfigTree> {
        if !self.contains(path) {
            return None;
        }
        self.descend_mut(path)
    }

    fn descend_mut(&mut self, path: &str) -> Option<&mut ConfigTree> {
        let ConfigTree::Branch(children) = self else {
            return None;
        };
        let (key, rest) = split_first(path);
        let child = Rc::make_mut(children.get_mut(key)?);
        match rest {
            None => Some(child),
            Some(rest) => child.descend_mut(rest),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Assign or remove the node at a dotted path.
    ///
    /// `None` removes the entry and never creates intermediate nodes.
    /// Otherwise missing intermediate nodes are created. A
    /// leaf on the way is turned into a branch and loses its value.
    #[instrument(level = "trace", skip(self, node))]
    pub fn set(&mut self, path: &str, node: Option<ConfigTree>) {
        match node {
            Some(node) => self.set_shared(path, Rc::new(node)),
            None => {
                self.remove(path);
            }
        }
    }

    /// Assign an existing shared handle at a dotted path.
    ///
    /// The subtree is not copied; both owners hold the same handle until one
    /// of them writes to it.
    pub fn set_shared(&mut self, path: &str, node: SharedNode) {
        let children = self.branch_mut();
        match split_first(path) {
            (key, None) => {
                children.insert(key.to_string(), node);
            }
            (key, Some(rest)) => {
                let child = children
                    .entry(key.to_string())
                    .or_insert_with(|| Rc::new(ConfigTree::new()));
                Rc::make_mut(child).set_shared(rest, node);
            }
        }
    }

    /// Set a leaf value at a dotted path.
    pub fn insert(&mut self, path: &str, value: impl Into<Value>) {
        self.set(path, Some(ConfigTree::leaf(value)));
    }

    /// Remove the node at a dotted path and return it.
    ///
    /// Removing under a leaf or a missing path does nothing.
    pub fn remove(&mut self, path: &str) -> Option<SharedNode> {
        let ConfigTree::Branch(children) = self else {
            return None;
        };
        match split_first(path) {
            (key, None) => children.remove(key),
            (key, Some(rest)) => children
                .get_mut(key)
                .filter(|child| child.contains(rest))
                .and_then(|child| Rc::make_mut(child).remove(rest)),
        }
    }

    fn branch_mut(&mut self) -> &mut BTreeMap<String, SharedNode> {
        if let ConfigTree::Leaf(value) = self {
            if !value.is_null() {
                trace!(%value, "leaf becomes branch, dropping value");
            }
            *self = ConfigTree::Branch(BTreeMap::new());
        }
        match self {
            ConfigTree::Branch(children) => children,
            ConfigTree::Leaf(_) => unreachable!("leaf was replaced by a branch"),
        }
    }
}

impl From<Value> for ConfigTree {
    fn from(value: Value) -> Self {
        ConfigTree::from_value(value)
    }
}

impl From<toml::Value> for ConfigTree {
    fn from(value: toml::Value) -> Self {
        ConfigTree::from_value(from_toml(value))
    }
}

impl From<&ConfigTree> for Value {
    fn from(tree: &ConfigTree) -> Self {
        tree.to_value()
    }
}

impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl Serialize for ConfigTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConfigTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ConfigTree::from_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing;
    use rstest::rstest;
    use serde_json::json;

    #[ctor::ctor]
    fn init() {
        testing::init_test_setup();
    }

    #[rstest]
    #[case(json!(null))]
    #[case(json!(1))]
    #[case(json!("text"))]
    #[case(json!(true))]
    #[case(json!([1, {"a": 2}]))]
    #[case(json!({"a": 1, "b": {"c": "x", "d": null}}))]
    #[case(json!({"empty": {}}))]
    fn test_round_trip(#[case] value: Value) {
        assert_eq!(ConfigTree::from_value(value.clone()).to_value(), value);
    }

    #[test]
    fn test_dotted_keys_are_split_on_construction() {
        let tree = ConfigTree::from_value(json!({"a.b": 5}));

        assert_eq!(tree.get("a.b").and_then(|n| n.value()), Some(&json!(5)));
        assert_eq!(
            tree.get("a").and_then(|n| n.get("b")).and_then(|n| n.value()),
            Some(&json!(5))
        );
        assert_eq!(tree.to_value(), json!({"a": {"b": 5}}));
    }

    #[test]
    fn test_dotted_key_joins_existing_branch() {
        let tree = ConfigTree::from_value(json!({"a": {"x": 1}, "a.y": 2}));
        assert_eq!(tree.to_value(), json!({"a": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_set_value_drops_prior_state() {
        let mut tree = ConfigTree::from_value(json!({"a": 1}));

        tree.set_value(Value::Null);

        assert!(tree.is_leaf());
        assert!(tree.is_empty());
        assert_eq!(tree.to_value(), Value::Null);
    }

    #[test]
    fn test_set_creates_intermediate_branches() {
        let mut tree = ConfigTree::new();

        tree.set("a.b.c", Some(ConfigTree::leaf(42)));

        assert!(!tree.get("a").unwrap().is_leaf());
        assert!(!tree.get("a.b").unwrap().is_leaf());
        assert_eq!(tree.get("a.b.c").unwrap().value(), Some(&json!(42)));
    }

    #[test]
    fn test_set_under_leaf_turns_it_into_branch() {
        let mut tree = ConfigTree::from_value(json!({"a": 1}));

        tree.insert("a.b", 2);

        let a = tree.get("a").unwrap();
        assert!(!a.is_leaf());
        assert_eq!(a.value(), None);
        assert_eq!(tree.to_value(), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_set_none_removes_single_segment() {
        let mut tree = ConfigTree::from_value(json!({"a": 1, "b": 2}));

        tree.set("a", None);

        assert_eq!(tree.to_value(), json!({"b": 2}));
    }

    #[test]
    fn test_set_none_removes_nested_segment() {
        let mut tree = ConfigTree::from_value(json!({"a": {"b": 1, "c": 2}}));

        tree.set("a.b", None);

        assert_eq!(tree.to_value(), json!({"a": {"c": 2}}));
    }

    #[test]
    fn test_set_none_on_missing_path_creates_nothing() {
        let mut tree = ConfigTree::from_value(json!({"a": 1}));

        tree.set("x.y", None);

        assert!(!tree.contains("x"));
        assert_eq!(tree.to_value(), json!({"a": 1}));
    }

    #[test]
    fn test_remove_missing_path_is_noop() {
        let mut tree = ConfigTree::from_value(json!({"a": 1}));

        assert!(tree.remove("x.y").is_none());
        assert!(tree.remove("a.b").is_none());
        assert_eq!(tree.to_value(), json!({"a": 1}));
    }

    #[test]
    fn test_removing_last_child_leaves_empty_branch() {
        let mut tree = ConfigTree::from_value(json!({"a": 1}));

        tree.remove("a");

        assert!(!tree.is_leaf());
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn test_get_missing_or_through_leaf_returns_none() {
        let tree = ConfigTree::from_value(json!({"a": 1}));

        assert!(tree.get("b").is_none());
        assert!(tree.get("a.b").is_none());
        assert!(ConfigTree::new().get("a").is_none());
    }

    #[test]
    fn test_get_mut_copies_shared_subtree() {
        let shared = Rc::new(ConfigTree::from_value(json!({"x": 1})));
        let mut first = ConfigTree::new();
        let mut second = ConfigTree::new();
        first.set_shared("s", Rc::clone(&shared));
        second.set_shared("s", Rc::clone(&shared));

        first.get_mut("s.x").unwrap().set_value(json!(2));

        assert_eq!(first.to_value(), json!({"s": {"x": 2}}));
        assert_eq!(second.to_value(), json!({"s": {"x": 1}}));
        assert_eq!(shared.to_value(), json!({"x": 1}));
    }

    #[test]
    fn test_get_shared_returns_same_handle() {
        let node = Rc::new(ConfigTree::leaf("v"));
        let mut tree = ConfigTree::new();
        tree.set_shared("a.b", Rc::clone(&node));

        let found = tree.get_shared("a.b").unwrap();

        assert!(Rc::ptr_eq(&found, &node));
        assert!(tree.get_shared("a.c").is_none());
    }

    #[test]
    fn test_children_and_keys_are_sorted() {
        let tree = ConfigTree::from_value(json!({"b": 1, "a": 2, "c": {"d": 3}}));

        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(tree.len(), 3);
        assert_eq!(ConfigTree::leaf(1).children().count(), 0);
    }

    #[test]
    fn test_serde_goes_through_dynamic_value() {
        let tree: ConfigTree = serde_json::from_str(r#"{"a.b": [1, 2]}"#).unwrap();

        assert_eq!(tree.get("a.b").unwrap().value(), Some(&json!([1, 2])));
        assert_eq!(serde_json::to_string(&tree).unwrap(), r#"{"a":{"b":[1,2]}}"#);
    }

    #[test]
    fn test_from_toml_value() {
        let parsed: toml::Value = toml::from_str("[server]\nport = 80").unwrap();
        let tree = ConfigTree::from(parsed);

        assert_eq!(tree.get("server.port").unwrap().value(), Some(&json!(80)));
    }

    #[test]
    fn test_display_is_compact_json() {
        let tree = ConfigTree::from_value(json!({"a": {"b": 1}}));
        assert_eq!(tree.to_string(), r#"{"a":{"b":1}}"#);
    }
}
