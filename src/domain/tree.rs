//! Tree algorithms over `Node`: lookup, traversal and structural edits.
//!
//! All edits keep `depth` consistent: a child sits at parent depth + 1.

use std::collections::HashSet;

use tracing::{instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{Fields, Group, Individual, Link, Node, NodeId};

/// A node together with its position under its parent.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub node: &'a Node,
    /// Enclosing group, `None` for the root
    pub parent: Option<&'a Group>,
    /// Index within the parent's children (0 for the root)
    pub index: usize,
}

/// Pre-order, left-to-right traversal.
pub struct NodeIter<'a> {
    stack: Vec<Visit<'a>>,
}

impl<'a> NodeIter<'a> {
    fn new(root: &'a Node) -> Self {
        Self {
            stack: vec![Visit {
                node: root,
                parent: None,
                index: 0,
            }],
        }
    }
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Node::Group(group) = current.node {
            // Push children in reverse order for left-to-right traversal
            for (index, child) in group.children.iter().enumerate().rev() {
                self.stack.push(Visit {
                    node: child,
                    parent: Some(group),
                    index,
                });
            }
        }
        Some(current)
    }
}

/// What happened to a group after one of its children was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reshape {
    /// Two or more children remain
    Unchanged,
    /// Sole remaining group child replaced its parent
    Promoted,
    /// Parent replaced by an individual carrying the sole child's fields
    Collapsed,
}

impl Node {
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter::new(self)
    }

    /// Depth-first lookup by id.
    pub fn find(&self, id: &NodeId) -> Option<&Node> {
        if self.id() == id {
            return Some(self);
        }
        match self {
            Node::Group(group) => group.children.iter().find_map(|c| c.find(id)),
            Node::Individual(_) => None,
        }
    }

    pub fn find_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        if self.id() == id {
            return Some(self);
        }
        match self {
            Node::Group(group) => group.children.iter_mut().find_map(|c| c.find_mut(id)),
            Node::Individual(_) => None,
        }
    }

    /// All leaf conditions, left to right.
    pub fn leaves(&self) -> impl Iterator<Item = &Individual> {
        self.iter().filter_map(|visit| match visit.node {
            Node::Individual(leaf) => Some(leaf),
            Node::Group(_) => None,
        })
    }

    /// Deepest `depth` value in the tree.
    pub fn max_depth(&self) -> usize {
        self.iter().map(|v| v.node.depth()).max().unwrap_or(0)
    }

    /// Turn an individual into an AND group of two conditions: one carrying
    /// the original fields, one empty. Returns the new group's id, or `None`
    /// when `self` is already a group.
    #[instrument(level = "trace", skip(self), fields(id = %self.id()))]
    pub(crate) fn promote_to_group(&mut self) -> Option<NodeId> {
        let Node::Individual(leaf) = self else {
            return None;
        };
        let depth = leaf.depth;
        let fields = std::mem::take(&mut leaf.fields);
        let group = Group {
            id: NodeId::generate(),
            link: Link::And,
            children: vec![
                Node::Individual(Individual::with_fields(fields, depth + 1)),
                Node::Individual(Individual::empty(depth + 1)),
            ],
            depth,
        };
        let id = group.id.clone();
        *self = Node::Group(group);
        Some(id)
    }

    /// Collapse or promote a group left with a single child.
    ///
    /// The replacement keeps this node's depth; the spliced subtree moves up
    /// one level.
    #[instrument(level = "trace", skip(self), fields(id = %self.id()))]
    pub(crate) fn reshape_single_child(&mut self) -> Reshape {
        let Node::Group(group) = self else {
            return Reshape::Unchanged;
        };
        if group.children.len() != 1 {
            return Reshape::Unchanged;
        }
        let depth = group.depth;
        let Some(mut only) = group.children.pop() else {
            return Reshape::Unchanged;
        };
        shift_up(&mut only);

        let (replacement, reshape) = match only {
            Node::Group(child) if child.children.len() >= 2 => {
                (Node::Group(Group { depth, ..child }), Reshape::Promoted)
            }
            Node::Group(child) => (
                Node::Individual(Individual {
                    id: child.id,
                    fields: Fields::new(),
                    depth,
                }),
                Reshape::Collapsed,
            ),
            Node::Individual(leaf) => (
                Node::Individual(Individual { depth, ..leaf }),
                Reshape::Collapsed,
            ),
        };
        trace!(?reshape, "reshaped group");
        *self = replacement;
        reshape
    }
}

impl Group {
    /// Append an empty condition one level below this group.
    pub(crate) fn append_empty(&mut self) -> NodeId {
        let leaf = Individual::empty(self.depth + 1);
        let id = leaf.id.clone();
        self.children.push(Node::Individual(leaf));
        id
    }
}

/// Decrement `depth` of every node in the subtree, saturating at 0.
pub fn shift_up(node: &mut Node) {
    node.set_depth(node.depth().saturating_sub(1));
    if let Node::Group(group) = node {
        group.children.iter_mut().for_each(shift_up);
    }
}

/// Recompute depths so that `node` sits at `depth`.
pub fn relabel(node: &mut Node, depth: usize) {
    node.set_depth(depth);
    if let Node::Group(group) = node {
        for child in &mut group.children {
            relabel(child, depth + 1);
        }
    }
}

/// Bring caller-supplied data in line with the tree invariants.
///
/// Single-child groups are reshaped bottom-up, depths are recomputed from the
/// root, and empty groups, duplicate ids or nodes deeper than `max_deep` are
/// rejected.
#[instrument(level = "debug", skip(node), fields(root = %node.id()))]
pub fn normalize(node: &mut Node, max_deep: usize) -> DomainResult<()> {
    reshape_bottom_up(node)?;
    relabel(node, 0);

    let mut seen = HashSet::new();
    for visit in node.iter() {
        let id = visit.node.id();
        if !seen.insert(id) {
            return Err(DomainError::DuplicateId(id.clone()));
        }
        if visit.node.depth() > max_deep {
            return Err(DomainError::DepthExceeded {
                id: id.clone(),
                depth: visit.node.depth(),
                max_deep,
            });
        }
    }
    Ok(())
}

fn reshape_bottom_up(node: &mut Node) -> DomainResult<()> {
    if let Node::Group(group) = node {
        if group.children.is_empty() {
            return Err(DomainError::EmptyGroup(group.id.clone()));
        }
        for child in &mut group.children {
            reshape_bottom_up(child)?;
        }
    }
    node.reshape_single_child();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(id: &str, depth: usize) -> Node {
        Node::Individual(Individual {
            id: NodeId::from(id),
            fields: Fields::new(),
            depth,
        })
    }

    fn group(id: &str, depth: usize, children: Vec<Node>) -> Node {
        Node::Group(Group {
            id: NodeId::from(id),
            link: Link::Or,
            children,
            depth,
        })
    }

    //      root
    //     /    \
    //    a      g
    //          / \
    //         b   c
    fn sample() -> Node {
        group(
            "root",
            0,
            vec![leaf("a", 1), group("g", 1, vec![leaf("b", 2), leaf("c", 2)])],
        )
    }

    #[test]
    fn test_iter_is_preorder_left_to_right() {
        let tree = sample();
        let ids: Vec<&str> = tree.iter().map(|v| v.node.id().as_str()).collect();
        assert_eq!(ids, vec!["root", "a", "g", "b", "c"]);
    }

    #[test]
    fn test_iter_reports_parent_and_index() {
        let tree = sample();
        let c = tree.iter().find(|v| v.node.id().as_str() == "c").unwrap();
        assert_eq!(c.parent.unwrap().id.as_str(), "g");
        assert_eq!(c.index, 1);
    }

    #[test]
    fn test_find_and_find_mut() {
        let mut tree = sample();
        assert!(tree.find(&NodeId::from("b")).is_some());
        assert!(tree.find(&NodeId::from("zzz")).is_none());
        let b = tree.find_mut(&NodeId::from("b")).unwrap();
        b.set_depth(7);
        assert_eq!(tree.find(&NodeId::from("b")).unwrap().depth(), 7);
    }

    #[test]
    fn test_leaves_and_max_depth() {
        let tree = sample();
        let ids: Vec<&str> = tree.leaves().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(tree.max_depth(), 2);
    }

    #[test]
    fn test_promote_keeps_fields_in_first_child() {
        let mut fields = Fields::new();
        fields.insert("field".into(), json!(1));
        let mut node = Node::Individual(Individual {
            id: NodeId::from("x"),
            fields: fields.clone(),
            depth: 1,
        });

        let new_id = node.promote_to_group().unwrap();

        let group = node.as_group().unwrap();
        assert_eq!(group.id, new_id);
        assert_ne!(group.id.as_str(), "x");
        assert_eq!(group.link, Link::And);
        assert_eq!(group.depth, 1);
        assert_eq!(group.children.len(), 2);
        assert_eq!(group.children[0].fields(), Some(&fields));
        assert_eq!(group.children[1].fields(), Some(&Fields::new()));
        assert!(group.children.iter().all(|c| c.depth() == 2));
    }

    #[test]
    fn test_promote_on_group_is_refused() {
        let mut tree = sample();
        assert!(tree.promote_to_group().is_none());
    }

    #[test]
    fn test_reshape_collapses_single_individual() {
        let mut node = group("p", 0, vec![leaf("a", 1)]);
        assert_eq!(node.reshape_single_child(), Reshape::Collapsed);
        assert_eq!(node.id().as_str(), "a");
        assert_eq!(node.depth(), 0);
        assert!(!node.is_group());
    }

    #[test]
    fn test_reshape_promotes_single_group_and_shifts_depths() {
        let mut node = group(
            "p",
            0,
            vec![group("g", 1, vec![leaf("b", 2), group("h", 2, vec![leaf("c", 3), leaf("d", 3)])])],
        );

        assert_eq!(node.reshape_single_child(), Reshape::Promoted);

        assert_eq!(node.id().as_str(), "g");
        assert_eq!(node.depth(), 0);
        for visit in node.iter() {
            let expected = visit.parent.map(|p| p.depth + 1).unwrap_or(0);
            assert_eq!(visit.node.depth(), expected, "node {}", visit.node.id());
        }
    }

    #[test]
    fn test_reshape_leaves_wider_groups_alone() {
        let mut tree = sample();
        assert_eq!(tree.reshape_single_child(), Reshape::Unchanged);
    }

    #[test]
    fn test_shift_up_saturates_at_zero() {
        let mut node = group("p", 0, vec![leaf("a", 1)]);
        shift_up(&mut node);
        assert_eq!(node.depth(), 0);
        assert_eq!(node.children()[0].depth(), 0);
    }

    #[test]
    fn test_normalize_relabels_depths() {
        let mut tree = group("root", 5, vec![leaf("a", 9), leaf("b", 0)]);
        normalize(&mut tree, 3).unwrap();
        assert_eq!(tree.depth(), 0);
        assert!(tree.children().iter().all(|c| c.depth() == 1));
    }

    #[test]
    fn test_normalize_rejects_empty_group() {
        let mut tree = group("root", 0, vec![leaf("a", 1), group("g", 1, vec![])]);
        assert_eq!(
            normalize(&mut tree, 3),
            Err(DomainError::EmptyGroup(NodeId::from("g")))
        );
    }

    #[test]
    fn test_normalize_rejects_duplicate_ids() {
        let mut tree = group("root", 0, vec![leaf("a", 1), leaf("a", 1)]);
        assert_eq!(
            normalize(&mut tree, 3),
            Err(DomainError::DuplicateId(NodeId::from("a")))
        );
    }

    #[test]
    fn test_normalize_rejects_too_deep() {
        let mut tree = sample();
        assert!(matches!(
            normalize(&mut tree, 1),
            Err(DomainError::DepthExceeded { depth: 2, max_deep: 1, .. })
        ));
    }

    #[test]
    fn test_normalize_collapses_nested_single_child_groups() {
        let mut tree = group(
            "root",
            0,
            vec![leaf("a", 1), group("g", 1, vec![group("h", 2, vec![leaf("b", 3)])])],
        );
        normalize(&mut tree, 3).unwrap();
        let children = tree.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].id().as_str(), "b");
        assert_eq!(children[1].depth(), 1);
    }
}
