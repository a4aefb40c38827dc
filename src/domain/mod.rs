//! Domain layer: rule-tree data model and algorithms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod eligibility;
pub mod error;
pub mod node;
pub mod tree;
pub mod validate;

pub use eligibility::{
    coerce_max_deep, Affordances, Disabled, DisabledFlags, EditorContext,
};
pub use error::{DomainError, DomainResult};
pub use node::{fields_complete, is_empty_value, Fields, Group, Individual, Link, Node, NodeId};
pub use tree::{normalize, NodeIter, Reshape, Visit};
pub use validate::{is_complete, validate, ValidationMode};
