//! Node identities, names and references.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric node identifier qualified by namespace.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub namespace: u16,
    pub value: u32,
}

impl NodeId {
    pub const fn numeric(namespace: u16, value: u32) -> Self {
        Self { namespace, value }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns={};i={}", self.namespace, self.value)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({self})")
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed node id '{input}': expected ns=<n>;i=<v> or i=<v>")]
pub struct NodeIdParseError {
    pub input: String,
}

impl FromStr for NodeId {
    type Err = NodeIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || NodeIdParseError {
            input: s.to_string(),
        };
        let trimmed = s.trim();
        let (namespace, ident) = match trimmed.split_once(';') {
            Some((ns, ident)) => {
                let ns = ns.strip_prefix("ns=").ok_or_else(err)?;
                (ns.parse::<u16>().map_err(|_| err())?, ident)
            }
            None => (0, trimmed),
        };
        let value = ident
            .strip_prefix("i=")
            .ok_or_else(err)?
            .parse::<u32>()
            .map_err(|_| err())?;
        Ok(NodeId::numeric(namespace, value))
    }
}

/// Well-known identifiers of namespace 0.
pub mod ns0 {
    use super::NodeId;

    pub const BOOLEAN: NodeId = NodeId::numeric(0, 1);
    pub const INT32: NodeId = NodeId::numeric(0, 6);
    pub const UINT32: NodeId = NodeId::numeric(0, 7);
    pub const FLOAT: NodeId = NodeId::numeric(0, 10);
    pub const DOUBLE: NodeId = NodeId::numeric(0, 11);
    pub const STRING: NodeId = NodeId::numeric(0, 12);

    pub const ORGANIZES: NodeId = NodeId::numeric(0, 35);
    pub const HAS_MODELLING_RULE: NodeId = NodeId::numeric(0, 37);
    pub const HAS_TYPE_DEFINITION: NodeId = NodeId::numeric(0, 40);
    pub const HAS_SUBTYPE: NodeId = NodeId::numeric(0, 45);
    pub const HAS_COMPONENT: NodeId = NodeId::numeric(0, 47);

    pub const BASE_OBJECT_TYPE: NodeId = NodeId::numeric(0, 58);
    pub const FOLDER_TYPE: NodeId = NodeId::numeric(0, 61);
    pub const BASE_DATA_VARIABLE_TYPE: NodeId = NodeId::numeric(0, 63);
    pub const MODELLING_RULE_MANDATORY: NodeId = NodeId::numeric(0, 78);
    pub const OBJECTS_FOLDER: NodeId = NodeId::numeric(0, 85);
}

/// Browse name: a name qualified by the namespace that defines it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub namespace: u16,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: u16, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// Class of a node in the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeClass {
    Object,
    ObjectType,
    Variable,
    VariableType,
    ReferenceType,
    DataType,
    /// Marker nodes such as modelling rules.
    Other,
}

/// Reference kinds used by the plant hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Organizes,
    HasComponent,
    HasSubtype,
    HasTypeDefinition,
    HasModellingRule,
}

impl ReferenceKind {
    /// Node id of the reference type in namespace 0.
    pub fn type_id(self) -> NodeId {
        match self {
            ReferenceKind::Organizes => ns0::ORGANIZES,
            ReferenceKind::HasComponent => ns0::HAS_COMPONENT,
            ReferenceKind::HasSubtype => ns0::HAS_SUBTYPE,
            ReferenceKind::HasTypeDefinition => ns0::HAS_TYPE_DEFINITION,
            ReferenceKind::HasModellingRule => ns0::HAS_MODELLING_RULE,
        }
    }

    /// Hierarchical references are followed by browse-path resolution.
    pub fn is_hierarchical(self) -> bool {
        matches!(
            self,
            ReferenceKind::Organizes | ReferenceKind::HasComponent | ReferenceKind::HasSubtype
        )
    }
}

/// A forward reference from the owning node to `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub target: NodeId,
}

/// Read/write permission mask of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessLevel(u8);

impl AccessLevel {
    pub const READ: Self = Self(0b01);
    pub const WRITE: Self = Self(0b10);
    pub const READ_WRITE: Self = Self(0b11);

    pub fn can_read(self) -> bool {
        self.0 & Self::READ.0 != 0
    }

    pub fn can_write(self) -> bool {
        self.0 & Self::WRITE.0 != 0
    }
}
