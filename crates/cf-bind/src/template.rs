//! Type templates: the structural schema of each entity kind.
//!
//! A template is declared once at startup. Declaring it creates an object
//! type in the address space with one variable member per field, and
//! registers a [`TypeDescriptor`] that the binder instantiates from.

use std::collections::{HashMap, HashSet};

use cf_core::CellKind;
use cf_space::{AccessLevel, AddressSpace, NodeId, ValueKind};
use tracing::info;

use crate::error::{BindError, BindResult};

/// Who may write a field through the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Read,
    ReadWrite,
}

impl AccessMode {
    pub fn access_level(self) -> AccessLevel {
        match self {
            AccessMode::Read => AccessLevel::READ,
            AccessMode::ReadWrite => AccessLevel::READ_WRITE,
        }
    }
}

/// Protocol value kind of a cell kind.
pub fn value_kind(kind: CellKind) -> ValueKind {
    match kind {
        CellKind::Double => ValueKind::Double,
        CellKind::UInt32 => ValueKind::UInt32,
    }
}

/// Lowercase name of a cell kind, for messages.
pub fn kind_name(kind: CellKind) -> &'static str {
    match kind {
        CellKind::Double => "double",
        CellKind::UInt32 => "uint32",
    }
}

/// One named scalar field of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: CellKind,
    pub access: AccessMode,
    pub mandatory: bool,
}

impl FieldSpec {
    /// A mandatory field.
    pub fn mandatory(name: impl Into<String>, kind: CellKind, access: AccessMode) -> Self {
        Self {
            name: name.into(),
            kind,
            access,
            mandatory: true,
        }
    }

    /// An optional field; instances do not get a slot for it.
    pub fn optional(name: impl Into<String>, kind: CellKind, access: AccessMode) -> Self {
        Self {
            name: name.into(),
            kind,
            access,
            mandatory: false,
        }
    }
}

/// Declaration input: a kind name, an optional fixed node id, and its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub kind: String,
    pub node_id: Option<NodeId>,
    pub fields: Vec<FieldSpec>,
}

impl TypeSpec {
    pub fn new(kind: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            kind: kind.into(),
            node_id: None,
            fields,
        }
    }

    /// Pin the object type to a well-known node id.
    pub fn with_node_id(mut self, id: NodeId) -> Self {
        self.node_id = Some(id);
        self
    }
}

/// A declared type, reusable for any number of instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub kind: String,
    pub type_node: NodeId,
    pub fields: Vec<FieldSpec>,
}

impl TypeDescriptor {
    /// Fields every instance must bind.
    pub fn mandatory_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.mandatory)
    }
}

/// Registry of declared types.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a type and create its object type in `space`.
    ///
    /// Re-declaring a kind is a programming error; callers treat it as fatal.
    pub fn declare_type(
        &mut self,
        space: &mut AddressSpace,
        spec: TypeSpec,
    ) -> BindResult<TypeDescriptor> {
        if self.types.contains_key(&spec.kind) {
            return Err(BindError::DuplicateType { kind: spec.kind });
        }
        let mut seen = HashSet::new();
        for field in &spec.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(BindError::DuplicateField {
                    kind: spec.kind.clone(),
                    field: field.name.clone(),
                });
            }
        }

        let creation = |status| BindError::Creation {
            name: spec.kind.clone(),
            status,
        };
        let type_node = space
            .add_object_type(spec.node_id, &spec.kind)
            .map_err(creation)?;
        for field in &spec.fields {
            let member = space
                .add_type_variable(
                    type_node,
                    &field.name,
                    value_kind(field.kind),
                    field.access.access_level(),
                )
                .map_err(creation)?;
            if field.mandatory {
                space.add_mandatory(member).map_err(creation)?;
            }
        }

        let descriptor = TypeDescriptor {
            kind: spec.kind.clone(),
            type_node,
            fields: spec.fields,
        };
        info!(
            kind = %descriptor.kind,
            node = %type_node,
            fields = descriptor.fields.len(),
            "type declared"
        );
        self.types.insert(spec.kind, descriptor.clone());
        Ok(descriptor)
    }

    pub fn get(&self, kind: &str) -> BindResult<&TypeDescriptor> {
        self.types.get(kind).ok_or_else(|| BindError::UnknownType {
            kind: kind.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
