//! Rendering of rule trees as `termtree` trees for terminal display.

use itertools::Itertools;
use termtree::Tree;
use tracing::instrument;

use crate::domain::{fields_complete, EditorContext, Node, Visit};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

/// One-line label: link operator for groups, `key=value` pairs for conditions.
pub fn node_label(node: &Node) -> String {
    match node {
        Node::Group(group) => format!("{} [{}]", group.link, group.id),
        Node::Individual(leaf) => {
            let body = if leaf.fields.is_empty() {
                "<empty>".to_string()
            } else {
                leaf.fields
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .join(", ")
            };
            let marker = if fields_complete(&leaf.fields) { "" } else { " (incomplete)" };
            format!("{body}{marker} [{}]", leaf.id)
        }
    }
}

impl TreeNodeConvert for Node {
    #[instrument(level = "trace", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let leaves: Vec<_> = self.children().iter().map(|c| c.to_tree_string()).collect();
        Tree::new(node_label(self)).with_leaves(leaves)
    }
}

/// Like [`TreeNodeConvert::to_tree_string`], with the affordances the editor
/// would show appended to every label.
pub fn to_annotated_tree(root: &Node, ctx: &EditorContext) -> Tree<String> {
    fn build(visit: Visit<'_>, ctx: &EditorContext) -> Tree<String> {
        let flags = ctx.affordances_at(visit);
        let mut actions = Vec::new();
        if flags.show_add_sibling() {
            actions.push("+sibling");
        }
        if flags.show_add_child() {
            actions.push("+child");
        }
        if flags.change_link {
            actions.push("~link");
        }
        if flags.delete && visit.parent.is_some() {
            actions.push("-delete");
        }
        let label = if actions.is_empty() {
            node_label(visit.node)
        } else {
            format!("{} {{{}}}", node_label(visit.node), actions.join(" "))
        };

        let mut tree = Tree::new(label);
        if let Node::Group(group) = visit.node {
            for (index, child) in group.children.iter().enumerate() {
                tree.push(build(
                    Visit {
                        node: child,
                        parent: Some(group),
                        index,
                    },
                    ctx,
                ));
            }
        }
        tree
    }

    build(
        Visit {
            node: root,
            parent: None,
            index: 0,
        },
        ctx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Disabled, Fields, Group, Individual, Link, NodeId};
    use serde_json::json;

    fn sample() -> Node {
        let mut fields = Fields::new();
        fields.insert("field".into(), json!(1));
        Node::Group(Group {
            id: NodeId::from("g"),
            link: Link::Or,
            children: vec![
                Node::Individual(Individual {
                    id: NodeId::from("a"),
                    fields,
                    depth: 1,
                }),
                Node::Individual(Individual {
                    id: NodeId::from("b"),
                    fields: Fields::new(),
                    depth: 1,
                }),
            ],
            depth: 0,
        })
    }

    #[test]
    fn test_to_tree_string() {
        let rendered = sample().to_tree_string().to_string();
        assert!(rendered.starts_with("OR [g]"));
        assert!(rendered.contains("field=1 [a]"));
        assert!(rendered.contains("<empty> (incomplete) [b]"));
    }

    #[test]
    fn test_annotated_tree_marks_actions() {
        let ctx = EditorContext::new(3, Disabled::All(false));
        let rendered = to_annotated_tree(&sample(), &ctx).to_string();
        assert!(rendered.contains("OR [g] {~link}"));
        assert!(rendered.contains("field=1 [a] {+child -delete}"));
        assert!(rendered.contains("<empty> (incomplete) [b] {-delete}"));
    }
}
