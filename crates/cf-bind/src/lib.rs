//! cf-bind: declare entity types and bind instances to storage cells.
//!
//! - [`template`]: type templates and the registry that declares them
//! - [`bridge`]: value sources that read and write cells through the
//!   address space, with validation and write auditing
//! - [`binder`]: instance creation and per-field binding

pub mod binder;
pub mod bridge;
pub mod error;
pub mod template;

pub use binder::{BoundField, FieldBacking, Instance, InstanceBinder, unbound_fields};
pub use bridge::{DoubleSource, UInt32Source, source_for};
pub use error::{BindError, BindResult};
pub use template::{
    AccessMode, FieldSpec, TypeDescriptor, TypeRegistry, TypeSpec, kind_name, value_kind,
};
