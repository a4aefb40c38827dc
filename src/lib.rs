//! Rule-tree engine: nested AND/OR condition trees edited through
//! copy-on-write commands.
//!
//! ```
//! use ruletree::{EngineConfig, RuleTreeEngine};
//!
//! let mut engine = RuleTreeEngine::new(EngineConfig { max_deep: 2, ..Default::default() });
//! let root_id = engine.root().id().clone();
//! assert!(engine.promote_to_group(&root_id).is_applied());
//! assert_eq!(engine.root().children().len(), 2);
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;

pub use application::{
    Action, ApplicationError, EditOutcome, EngineConfig, IgnoreReason, RuleTreeEngine,
};
pub use domain::{
    Affordances, Disabled, DisabledFlags, DomainError, EditorContext, Fields, Group, Individual,
    Link, Node, NodeId, ValidationMode,
};
