//! cf-space: the address space the plant is published through.
//!
//! Provides:
//! - Node identities, browse names and references ([`node`])
//! - Protocol values and status codes ([`variant`], [`status`])
//! - The in-memory node store with entity creation, one-hop child
//!   resolution and value-source attachment ([`space`])
//! - The [`ValueSource`] trait implemented by bound fields
//! - Periodic task registration for the dispatch loop ([`scheduler`])
//!
//! # Example
//!
//! ```
//! use cf_space::{AccessLevel, AddressSpace, ValueKind, ns0};
//!
//! let mut space = AddressSpace::new();
//! let ty = space.add_object_type(None, "ReactorType").unwrap();
//! let volume = space
//!     .add_type_variable(ty, "REACTOR_VOLUME", ValueKind::Double, AccessLevel::READ_WRITE)
//!     .unwrap();
//! space.add_mandatory(volume).unwrap();
//!
//! let reactor = space.create_entity(ns0::OBJECTS_FOLDER, ty, "1-F").unwrap();
//! assert!(space.resolve_child(reactor, "REACTOR_VOLUME").is_ok());
//! ```

pub mod node;
pub mod scheduler;
pub mod source;
pub mod space;
pub mod status;
pub mod variant;

// Re-exports for ergonomics
pub use node::{
    AccessLevel, NodeClass, NodeId, NodeIdParseError, QualifiedName, Reference, ReferenceKind, ns0,
};
pub use scheduler::{Scheduler, TaskId};
pub use source::{FieldAccess, ValueSource};
pub use space::{APP_NAMESPACE, AddressSpace, BrowseEntry, Node, VariableAttrs};
pub use status::StatusCode;
pub use variant::{DataValue, NumericRange, RangeParseError, ValueKind, Variant};
