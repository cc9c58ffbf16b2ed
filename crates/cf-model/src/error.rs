//! Error types for the process model.

use cf_core::{CfError, Id};
use thiserror::Error;

/// Result type for process model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while building or ticking the plant.
///
/// Undefined kinetics results are not errors; see [`crate::kinetics::Undefined`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// Cell storage failure (bad handle, poisoned lock).
    #[error(transparent)]
    Core(#[from] CfError),

    /// A model context refers to an entity the plant does not own.
    #[error("Unknown {what} {id}")]
    UnknownEntity { what: &'static str, id: Id },
}
