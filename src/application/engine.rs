//! Rule-tree engine: owns one tree and applies edit commands to it.
//!
//! Every command works on a cloned draft that replaces the current tree only
//! when the command succeeds, so readers never see a half-applied edit.
//! Commands addressed to stale ids, the wrong node kind or a disabled action
//! are ignored and reported through [`EditOutcome`].

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::domain::validate::validate as ensure_complete;
use crate::domain::{
    coerce_max_deep, normalize, Affordances, DisabledFlags, DomainResult, EditorContext,
    Fields, Link, Node, NodeId, ValidationMode,
};

/// Editing actions that can be disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AddItem,
    DelItem,
    LinkChange,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::AddItem => f.write_str("add_item"),
            Action::DelItem => f.write_str("del_item"),
            Action::LinkChange => f.write_str("link_change"),
        }
    }
}

/// Why a command left the tree unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("not a group: {0}")]
    NotAGroup(NodeId),

    #[error("not an individual: {0}")]
    NotAnIndividual(NodeId),

    #[error("index {index} out of range for group {parent} with {len} children")]
    IndexOutOfRange {
        parent: NodeId,
        index: usize,
        len: usize,
    },

    #[error("group {0} would be left without children")]
    LastChild(NodeId),

    #[error("action disabled: {0}")]
    Disabled(Action),

    #[error("depth {depth} below {id} exceeds max depth {max_deep}")]
    DepthLimit {
        id: NodeId,
        depth: usize,
        max_deep: usize,
    },
}

/// Result of an edit command. Ignoring it is always safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    Ignored(IgnoreReason),
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied)
    }
}

/// Engine settings fixed at construction (adjustable through setters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_deep: usize,
    pub disabled: DisabledFlags,
    pub validation: ValidationMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_deep: 1,
            disabled: DisabledFlags::default(),
            validation: ValidationMode::default(),
        }
    }
}

/// Callback fired with the new root after every applied edit.
pub type ChangeListener = Box<dyn FnMut(&Node) + Send>;

pub struct RuleTreeEngine {
    tree: Arc<Node>,
    context: EditorContext,
    validation: ValidationMode,
    listeners: Vec<ChangeListener>,
}

impl fmt::Debug for RuleTreeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTreeEngine")
            .field("tree", &self.tree)
            .field("context", &self.context)
            .field("validation", &self.validation)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for RuleTreeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn locate<'a>(tree: &'a mut Node, id: &NodeId) -> Result<&'a mut Node, IgnoreReason> {
    tree.find_mut(id)
        .ok_or_else(|| IgnoreReason::NodeNotFound(id.clone()))
}

impl RuleTreeEngine {
    /// Engine holding a fresh tree (one empty condition at depth 0).
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tree: Arc::new(Node::default()),
            context: EditorContext::new(config.max_deep, config.disabled),
            validation: config.validation,
            listeners: Vec::new(),
        }
    }

    /// Engine hydrated from caller data; `None` yields a fresh tree.
    pub fn with_tree(config: EngineConfig, tree: Option<Node>) -> DomainResult<Self> {
        let mut engine = Self::new(config);
        if let Some(mut tree) = tree {
            normalize(&mut tree, engine.context.max_deep)?;
            engine.tree = Arc::new(tree);
        }
        Ok(engine)
    }

    /// Shared read-only view of the current tree.
    pub fn root(&self) -> Arc<Node> {
        Arc::clone(&self.tree)
    }

    pub fn context(&self) -> EditorContext {
        self.context
    }

    pub fn validation_mode(&self) -> ValidationMode {
        self.validation
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Node) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn affordances(&self) -> Vec<(NodeId, Affordances)> {
        self.context.affordances(&self.tree)
    }

    pub fn affordances_of(&self, id: &NodeId) -> Option<Affordances> {
        self.tree
            .iter()
            .find(|visit| visit.node.id() == id)
            .map(|visit| self.context.affordances_at(visit))
    }

    pub fn set_max_deep(&mut self, raw: i64) {
        self.context.max_deep = coerce_max_deep(raw);
        debug!(max_deep = self.context.max_deep, "max depth changed");
    }

    pub fn set_disabled(&mut self, disabled: impl Into<DisabledFlags>) {
        self.context.disabled = disabled.into();
        debug!(disabled = ?self.context.disabled, "disabled actions changed");
    }

    pub fn set_validation_mode(&mut self, mode: ValidationMode) {
        self.validation = mode;
    }

    /// Append an empty condition to the group `group_id`.
    #[instrument(level = "debug", skip(self), fields(group = %group_id))]
    pub fn add_sibling(&mut self, group_id: &NodeId) -> EditOutcome {
        if self.context.disabled.add_item {
            return Self::ignore(IgnoreReason::Disabled(Action::AddItem));
        }
        let max_deep = self.context.max_deep;
        self.edit(|tree| {
            let node = locate(tree, group_id)?;
            let group = node
                .as_group_mut()
                .ok_or_else(|| IgnoreReason::NotAGroup(group_id.clone()))?;
            let depth = group.depth + 1;
            if depth > max_deep {
                return Err(IgnoreReason::DepthLimit {
                    id: group_id.clone(),
                    depth,
                    max_deep,
                });
            }
            group.append_empty();
            Ok(())
        })
    }

    /// Turn a condition into an AND group of itself plus an empty condition;
    /// on a group, append an empty condition instead.
    #[instrument(level = "debug", skip(self), fields(node = %node_id))]
    pub fn promote_to_group(&mut self, node_id: &NodeId) -> EditOutcome {
        if self.context.disabled.add_item {
            return Self::ignore(IgnoreReason::Disabled(Action::AddItem));
        }
        let max_deep = self.context.max_deep;
        self.edit(|tree| {
            let node = locate(tree, node_id)?;
            let depth = node.depth() + 1;
            let nesting_allowed = node.is_group() || max_deep > 1;
            if depth > max_deep || !nesting_allowed {
                return Err(IgnoreReason::DepthLimit {
                    id: node_id.clone(),
                    depth,
                    max_deep,
                });
            }
            if let Some(group) = node.as_group_mut() {
                group.append_empty();
            } else {
                node.promote_to_group();
            }
            Ok(())
        })
    }

    /// Remove child `index` of group `parent_id`, reshaping the group when a
    /// single child remains.
    #[instrument(level = "debug", skip(self), fields(parent = %parent_id))]
    pub fn delete_node(&mut self, parent_id: &NodeId, index: usize) -> EditOutcome {
        if self.context.disabled.del_item {
            return Self::ignore(IgnoreReason::Disabled(Action::DelItem));
        }
        self.edit(|tree| {
            let parent = locate(tree, parent_id)?;
            let group = parent
                .as_group_mut()
                .ok_or_else(|| IgnoreReason::NotAGroup(parent_id.clone()))?;
            let len = group.children.len();
            if index >= len {
                return Err(IgnoreReason::IndexOutOfRange {
                    parent: parent_id.clone(),
                    index,
                    len,
                });
            }
            if len == 1 {
                return Err(IgnoreReason::LastChild(parent_id.clone()));
            }
            group.children.remove(index);
            let reshape = parent.reshape_single_child();
            debug!(?reshape, "removed child");
            Ok(())
        })
    }

    /// Merge `patch` into a condition's fields; patch keys overwrite.
    #[instrument(level = "debug", skip(self, patch), fields(node = %node_id))]
    pub fn update_field(&mut self, node_id: &NodeId, patch: Fields) -> EditOutcome {
        self.edit(|tree| {
            let fields = Self::fields_mut(tree, node_id)?;
            fields.extend(patch);
            Ok(())
        })
    }

    /// Replace a condition's fields wholesale.
    #[instrument(level = "debug", skip(self, fields), fields(node = %node_id))]
    pub fn replace_fields(&mut self, node_id: &NodeId, fields: Fields) -> EditOutcome {
        self.edit(|tree| {
            *Self::fields_mut(tree, node_id)? = fields;
            Ok(())
        })
    }

    #[instrument(level = "debug", skip(self), fields(group = %group_id))]
    pub fn set_link(&mut self, group_id: &NodeId, link: Link) -> EditOutcome {
        self.change_link(group_id, |_| link)
    }

    #[instrument(level = "debug", skip(self), fields(group = %group_id))]
    pub fn toggle_link(&mut self, group_id: &NodeId) -> EditOutcome {
        self.change_link(group_id, Link::toggled)
    }

    /// Deep copy of the current tree, checked for completeness when
    /// `validate` is set.
    #[instrument(level = "debug", skip(self))]
    pub fn snapshot(&self, validate: bool) -> DomainResult<Node> {
        if validate {
            ensure_complete(&self.tree, self.validation).inspect_err(|e| {
                error!(mode = ?self.validation, "{e}");
            })?;
        }
        Ok(Node::clone(&self.tree))
    }

    /// Replace the tree with a fresh single condition.
    #[instrument(level = "debug", skip(self))]
    pub fn reset(&mut self) {
        self.commit(Node::default());
    }

    /// Replace the tree with caller data; the current tree is kept when the
    /// data is malformed.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn hydrate(&mut self, tree: Option<Node>) -> DomainResult<()> {
        let tree = match tree {
            Some(mut tree) => {
                normalize(&mut tree, self.context.max_deep)?;
                tree
            }
            None => Node::default(),
        };
        self.commit(tree);
        Ok(())
    }

    fn change_link(&mut self, group_id: &NodeId, next: impl FnOnce(Link) -> Link) -> EditOutcome {
        if self.context.disabled.link_change {
            return Self::ignore(IgnoreReason::Disabled(Action::LinkChange));
        }
        self.edit(|tree| {
            let group = locate(tree, group_id)?
                .as_group_mut()
                .ok_or_else(|| IgnoreReason::NotAGroup(group_id.clone()))?;
            group.link = next(group.link);
            Ok(())
        })
    }

    fn fields_mut<'a>(tree: &'a mut Node, node_id: &NodeId) -> Result<&'a mut Fields, IgnoreReason> {
        match locate(tree, node_id)? {
            Node::Individual(leaf) => Ok(&mut leaf.fields),
            Node::Group(_) => Err(IgnoreReason::NotAnIndividual(node_id.clone())),
        }
    }

    fn edit(&mut self, apply: impl FnOnce(&mut Node) -> Result<(), IgnoreReason>) -> EditOutcome {
        let mut draft = Node::clone(&self.tree);
        match apply(&mut draft) {
            Ok(()) => {
                self.commit(draft);
                EditOutcome::Applied
            }
            Err(reason) => Self::ignore(reason),
        }
    }

    fn ignore(reason: IgnoreReason) -> EditOutcome {
        debug!(%reason, "edit ignored");
        EditOutcome::Ignored(reason)
    }

    fn commit(&mut self, tree: Node) {
        self.tree = Arc::new(tree);
        debug!(root = %self.tree.id(), nodes = self.tree.iter().count(), "tree updated");
        let root = Arc::clone(&self.tree);
        for listener in &mut self.listeners {
            listener(&root);
        }
    }
}
