//! Display-eligibility rules
//!
//! Pure functions deciding which action affordances a renderer shows for a
//! node. The editor settings travel as an explicit `EditorContext` instead of
//! being looked up from ambient state.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::node::{fields_complete, Node, NodeId};
use crate::domain::tree::Visit;

/// Per-action disablement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisabledFlags {
    pub add_item: bool,
    pub del_item: bool,
    pub link_change: bool,
}

impl DisabledFlags {
    pub fn all() -> Self {
        Self {
            add_item: true,
            del_item: true,
            link_change: true,
        }
    }
}

/// Disablement as accepted from callers: one switch for everything, or one
/// flag per action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Disabled {
    All(bool),
    Each(DisabledFlags),
}

impl Default for Disabled {
    fn default() -> Self {
        Disabled::All(false)
    }
}

impl From<Disabled> for DisabledFlags {
    fn from(value: Disabled) -> Self {
        match value {
            Disabled::All(true) => DisabledFlags::all(),
            Disabled::All(false) => DisabledFlags::default(),
            Disabled::Each(flags) => flags,
        }
    }
}

impl From<bool> for Disabled {
    fn from(value: bool) -> Self {
        Disabled::All(value)
    }
}

/// Coerce a configured maximum depth to at least 1.
///
/// Negative values use their magnitude, zero becomes 1; both log a warning.
pub fn coerce_max_deep(raw: i64) -> usize {
    if raw < 1 {
        warn!(max_deep = raw, "invalid max_deep: must be greater than 0");
    }
    match usize::try_from(raw.unsigned_abs()) {
        Ok(0) => 1,
        Ok(value) => value,
        Err(_) => usize::MAX,
    }
}

/// Read-only editor settings the eligibility rules depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorContext {
    pub max_deep: usize,
    pub disabled: DisabledFlags,
}

impl Default for EditorContext {
    fn default() -> Self {
        Self {
            max_deep: 1,
            disabled: DisabledFlags::default(),
        }
    }
}

/// Affordance flags for one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub add_sibling: bool,
    pub add_child_group: bool,
    pub create_visible: bool,
    pub delete: bool,
    pub change_link: bool,
}

impl Affordances {
    /// Renderer shows "add sibling" only when creation is visible at all.
    pub fn show_add_sibling(&self) -> bool {
        self.create_visible && self.add_sibling
    }

    pub fn show_add_child(&self) -> bool {
        self.create_visible && self.add_child_group
    }
}

/// Last position among `siblings`, or second-to-last when the last sibling is
/// a group (the group renders its own controls).
pub fn is_last_condition(index: usize, siblings: &[Node]) -> bool {
    let Some(last_index) = siblings.len().checked_sub(1) else {
        return false;
    };
    if index == last_index {
        return true;
    }
    siblings[last_index].is_group() && last_index >= 1 && index == last_index - 1
}

pub fn can_add_sibling(node: &Node, index: usize, siblings: &[Node]) -> bool {
    node.depth() >= 1 && is_last_condition(index, siblings)
}

impl EditorContext {
    /// A `max_deep` of 0 is coerced to 1 with a warning.
    pub fn new(max_deep: usize, disabled: impl Into<DisabledFlags>) -> Self {
        if max_deep == 0 {
            warn!(max_deep, "invalid max_deep: must be greater than 0");
        }
        Self {
            max_deep: max_deep.max(1),
            disabled: disabled.into(),
        }
    }

    pub fn can_add_child_group(&self, node: &Node) -> bool {
        self.max_deep > 1 && node.depth() < self.max_deep
    }

    /// Creation controls shown at all: nesting allowed, the node's own
    /// fields filled in, adding not disabled.
    pub fn create_visible(&self, node: &Node) -> bool {
        self.max_deep > 1 && node.fields().is_some_and(fields_complete) && !self.disabled.add_item
    }

    pub fn can_delete(&self) -> bool {
        !self.disabled.del_item
    }

    pub fn can_change_link(&self) -> bool {
        !self.disabled.link_change
    }

    /// The top-level "add condition" entry is shown whenever adding is enabled.
    pub fn can_create_at_root(&self) -> bool {
        !self.disabled.add_item
    }

    pub fn affordances_at(&self, visit: Visit<'_>) -> Affordances {
        let node = visit.node;
        let add_sibling = visit
            .parent
            .is_some_and(|parent| can_add_sibling(node, visit.index, &parent.children));
        Affordances {
            add_sibling,
            add_child_group: self.can_add_child_group(node),
            create_visible: self.create_visible(node),
            delete: self.can_delete(),
            change_link: node.is_group() && self.can_change_link(),
        }
    }

    /// Flags for every node of `root`, in pre-order.
    pub fn affordances(&self, root: &Node) -> Vec<(NodeId, Affordances)> {
        root.iter()
            .map(|visit| (visit.node.id().clone(), self.affordances_at(visit)))
            .collect()
    }
}
