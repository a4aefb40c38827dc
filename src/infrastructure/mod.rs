//! Infrastructure layer: reading and writing trees as JSON text
//!
//! The engine never touches files; the command-line host goes through here.

pub mod error;
pub mod json;

pub use error::{InfraError, InfraResult};
