//! Rule-tree nodes: the `Node` sum type and its payloads

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Opaque field/operator/value mapping of one condition.
/// The shape is owned by the caller; the core only inspects emptiness.
/// Keys keep the caller's insertion order.
pub type Fields = Map<String, Value>;

/// Stable node identifier, generated on creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Boolean operator joining the children of a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Link {
    #[default]
    And,
    Or,
}

impl Link {
    /// The other operator (AND <-> OR).
    pub fn toggled(self) -> Self {
        match self {
            Link::And => Link::Or,
            Link::Or => Link::And,
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::And => f.write_str("AND"),
            Link::Or => f.write_str("OR"),
        }
    }
}

impl std::str::FromStr for Link {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(Link::And),
            "or" => Ok(Link::Or),
            other => Err(format!("unknown link operator: {other}")),
        }
    }
}

/// Leaf condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    #[serde(rename = "_id")]
    pub id: NodeId,
    #[serde(rename = "individual", default)]
    pub fields: Fields,
    #[serde(rename = "level", default)]
    pub depth: usize,
}

impl Individual {
    /// Empty condition at `depth` with a fresh id.
    pub fn empty(depth: usize) -> Self {
        Self::with_fields(Fields::new(), depth)
    }

    pub fn with_fields(fields: Fields, depth: usize) -> Self {
        Self {
            id: NodeId::generate(),
            fields,
            depth,
        }
    }
}

/// Children combined under one link operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: NodeId,
    #[serde(default)]
    pub link: Link,
    #[serde(rename = "group", default)]
    pub children: Vec<Node>,
    #[serde(rename = "level", default)]
    pub depth: usize,
}

/// A node of the rule tree.
///
/// Serialized as a flat record tagged by `framework`:
/// `{"_id": .., "framework": "group", "link": "and", "group": [..], "level": 0}`
/// or `{"_id": .., "framework": "individual", "individual": {..}, "level": 1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "framework", rename_all = "lowercase")]
pub enum Node {
    Individual(Individual),
    Group(Group),
}

impl Default for Node {
    /// Fresh tree: a single empty condition at depth 0.
    fn default() -> Self {
        Node::Individual(Individual::empty(0))
    }
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Individual(leaf) => &leaf.id,
            Node::Group(group) => &group.id,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Node::Individual(leaf) => leaf.depth,
            Node::Group(group) => group.depth,
        }
    }

    pub(crate) fn set_depth(&mut self, depth: usize) {
        match self {
            Node::Individual(leaf) => leaf.depth = depth,
            Node::Group(group) => group.depth = depth,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Node::Group(_))
    }

    /// Field mapping of an individual, `None` for groups.
    pub fn fields(&self) -> Option<&Fields> {
        match self {
            Node::Individual(leaf) => Some(&leaf.fields),
            Node::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(group) => Some(group),
            Node::Individual(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Node::Group(group) => Some(group),
            Node::Individual(_) => None,
        }
    }

    /// Direct children; empty for individuals.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Group(group) => &group.children,
            Node::Individual(_) => &[],
        }
    }
}

/// Whether a single field value counts as "not filled in".
///
/// `null`, `""`, `[]` and `{}` are empty; `0` and `false` are not.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// A mapping is complete when it has at least one key and no empty value.
pub fn fields_complete(fields: &Fields) -> bool {
    !fields.is_empty() && fields.values().all(|v| !is_empty_value(v))
}
