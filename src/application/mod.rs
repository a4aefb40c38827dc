//! Application layer: the editing engine
//!
//! This layer orchestrates domain algorithms behind command entry points.

pub mod engine;
pub mod error;

pub use engine::{
    Action, ChangeListener, EditOutcome, EngineConfig, IgnoreReason, RuleTreeEngine,
};
pub use error::{ApplicationError, ApplicationResult};
