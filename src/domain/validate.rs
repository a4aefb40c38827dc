//! Completeness checks run before a validated snapshot is handed out

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{fields_complete, Node};

/// How group completeness is derived from the leaves beneath it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationMode {
    /// A group is complete when at least one leaf beneath it is complete.
    #[default]
    AnyLeaf,
    /// A group is complete only when every leaf beneath it is complete.
    AllLeaves,
}

impl std::str::FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any-leaf" => Ok(ValidationMode::AnyLeaf),
            "all-leaves" => Ok(ValidationMode::AllLeaves),
            other => Err(format!("unknown validation mode: {other}")),
        }
    }
}

/// Whether `node` satisfies `mode`.
pub fn is_complete(node: &Node, mode: ValidationMode) -> bool {
    match node {
        Node::Individual(leaf) => fields_complete(&leaf.fields),
        Node::Group(group) => match mode {
            ValidationMode::AnyLeaf => group.children.iter().any(|c| is_complete(c, mode)),
            ValidationMode::AllLeaves => group.children.iter().all(|c| is_complete(c, mode)),
        },
    }
}

/// `Ok(())` when complete, otherwise `DomainError::IncompleteEntries`.
pub fn validate(node: &Node, mode: ValidationMode) -> DomainResult<()> {
    if is_complete(node, mode) {
        Ok(())
    } else {
        Err(DomainError::IncompleteEntries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::{Fields, Group, Individual, Link, NodeId};
    use serde_json::json;

    fn leaf(complete: bool) -> Node {
        let mut fields = Fields::new();
        fields.insert("field".into(), json!(1));
        fields.insert("value".into(), if complete { json!(2) } else { json!(null) });
        Node::Individual(Individual::with_fields(fields, 1))
    }

    fn group(children: Vec<Node>) -> Node {
        Node::Group(Group {
            id: NodeId::generate(),
            link: Link::And,
            children,
            depth: 0,
        })
    }

    #[test]
    fn test_single_individual_follows_its_fields() {
        assert!(validate(&leaf(true), ValidationMode::AnyLeaf).is_ok());
        assert_eq!(
            validate(&leaf(false), ValidationMode::AnyLeaf),
            Err(DomainError::IncompleteEntries)
        );
    }

    #[test]
    fn test_fresh_tree_is_incomplete() {
        assert!(!is_complete(&Node::default(), ValidationMode::AnyLeaf));
    }

    #[test]
    fn test_any_leaf_accepts_mixed_group() {
        let tree = group(vec![leaf(false), group(vec![leaf(false), leaf(true)])]);
        assert!(is_complete(&tree, ValidationMode::AnyLeaf));
        assert!(!is_complete(&tree, ValidationMode::AllLeaves));
    }

    #[test]
    fn test_any_leaf_rejects_group_without_complete_leaf() {
        let tree = group(vec![leaf(false), leaf(false)]);
        assert!(!is_complete(&tree, ValidationMode::AnyLeaf));
    }

    #[test]
    fn test_all_leaves_accepts_fully_filled_tree() {
        let tree = group(vec![leaf(true), group(vec![leaf(true), leaf(true)])]);
        assert!(is_complete(&tree, ValidationMode::AllLeaves));
    }

    #[test]
    fn test_mode_parses_from_kebab_case() {
        assert_eq!("all-leaves".parse::<ValidationMode>().unwrap(), ValidationMode::AllLeaves);
        assert!("strict".parse::<ValidationMode>().is_err());
    }
}
