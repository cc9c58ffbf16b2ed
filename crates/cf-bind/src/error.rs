//! Error types for type declaration and instance binding.

use cf_space::{NodeId, StatusCode};
use thiserror::Error;

/// Result type for binding operations.
pub type BindResult<T> = Result<T, BindError>;

/// Errors raised while declaring types or binding instances.
///
/// All of these are startup errors; none is produced by a client request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindError {
    /// The type kind was already declared.
    #[error("Type '{kind}' is already declared")]
    DuplicateType { kind: String },

    /// A template lists the same field twice.
    #[error("Type '{kind}' declares field '{field}' more than once")]
    DuplicateField { kind: String, field: String },

    /// No type registered under this kind.
    #[error("Unknown type '{kind}'")]
    UnknownType { kind: String },

    /// The address space refused to create a node.
    #[error("Failed to create '{name}': {status}")]
    Creation { name: String, status: StatusCode },

    /// The child slot for a template field is missing or ambiguous.
    #[error("Field '{field}' not found under {parent}: {status}")]
    ChildResolution {
        parent: NodeId,
        field: String,
        status: StatusCode,
    },

    /// The backing struct has no cell for a mandatory field.
    #[error("Mandatory field '{field}' of '{instance}' has no storage cell")]
    UnboundField { instance: String, field: String },

    /// The backing cell kind differs from the declared field kind.
    #[error("Field '{field}' of '{instance}' is declared {declared} but backed by a {actual} cell")]
    KindMismatch {
        instance: String,
        field: String,
        declared: &'static str,
        actual: &'static str,
    },

    /// The cell is already exposed through another slot.
    #[error("Storage cell for '{field}' is already exposed at {existing}")]
    CellAliased { field: String, existing: NodeId },

    /// Context or value-source attachment failed.
    #[error("Failed to attach '{field}' at {node}: {status}")]
    Attach {
        node: NodeId,
        field: String,
        status: StatusCode,
    },
}
