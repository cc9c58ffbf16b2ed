//! Value sources: the handlers that back a variable node.
//!
//! A variable bound to a value source does not store its value. Every read
//! and write is forwarded to the source together with the context attached
//! to the node (the storage cell it stands for).

use core::fmt;

use cf_core::CellRef;

use crate::node::{NodeId, QualifiedName};
use crate::status::StatusCode;
use crate::variant::{DataValue, NumericRange, ValueKind};

/// The node a read or write targets, as seen by a value source.
#[derive(Debug, Clone, Copy)]
pub struct FieldAccess<'a> {
    pub node: NodeId,
    pub browse_name: Option<&'a QualifiedName>,
    pub context: Option<CellRef>,
}

impl FieldAccess<'_> {
    /// Name used in audit lines: browse name, else raw node id.
    pub fn display_name(&self) -> String {
        match self.browse_name {
            Some(name) => name.name.clone(),
            None => self.node.to_string(),
        }
    }
}

/// Read/write capability of a bound field.
pub trait ValueSource: Send + fmt::Debug {
    /// Kind of value this source serves.
    fn kind(&self) -> ValueKind;

    /// Produce the current value of the field.
    fn read(
        &self,
        field: &FieldAccess<'_>,
        range: Option<&NumericRange>,
        include_source_timestamp: bool,
    ) -> Result<DataValue, StatusCode>;

    /// Validate and commit a new value. Must leave the field untouched on error.
    fn write(
        &self,
        field: &FieldAccess<'_>,
        range: Option<&NumericRange>,
        value: &DataValue,
    ) -> Result<(), StatusCode>;
}
