//! Value sources that connect protocol-visible slots to storage cells.
//!
//! Reads copy the current cell content into a timestamped [`DataValue`].
//! Writes are validated in a fixed order and either commit completely or
//! leave the cell untouched:
//!
//! 1. a storage context is bound (`BadInternalError`)
//! 2. the container carries a value (`BadInvalidArgument`)
//! 3. no index range is requested (`BadIndexRangeInvalid`)
//! 4. the value is a scalar of exactly the field kind (`BadTypeMismatch`)
//! 5. doubles are finite (`BadOutOfRange`)
//!
//! The process model never goes through these handlers, so anything it reads
//! from a cell has already passed them.

use cf_core::{CellRef, DoubleCell, SharedCells, UInt32Cell};
use cf_space::{DataValue, FieldAccess, NumericRange, StatusCode, ValueKind, ValueSource, Variant};
use tracing::{info, warn};

/// Reject every read or write addressing a sub-range of a scalar.
fn ensure_whole_value(range: Option<&NumericRange>) -> Result<(), StatusCode> {
    match range {
        Some(r) if !r.is_empty() => Err(StatusCode::BAD_INDEX_RANGE_INVALID),
        _ => Ok(()),
    }
}

/// Checks 2 to 4: present, unranged, scalar of the expected kind.
fn incoming_scalar<'v>(
    range: Option<&NumericRange>,
    value: &'v DataValue,
    expected: ValueKind,
) -> Result<&'v Variant, StatusCode> {
    let variant = value.value.as_ref().ok_or(StatusCode::BAD_INVALID_ARGUMENT)?;
    ensure_whole_value(range)?;
    if variant.scalar_kind() != Some(expected) {
        return Err(StatusCode::BAD_TYPE_MISMATCH);
    }
    Ok(variant)
}

fn double_context(field: &FieldAccess<'_>) -> Result<DoubleCell, StatusCode> {
    match field.context {
        Some(CellRef::Double(cell)) => Ok(cell),
        _ => Err(StatusCode::BAD_INTERNAL_ERROR),
    }
}

fn uint32_context(field: &FieldAccess<'_>) -> Result<UInt32Cell, StatusCode> {
    match field.context {
        Some(CellRef::UInt32(cell)) => Ok(cell),
        _ => Err(StatusCode::BAD_INTERNAL_ERROR),
    }
}

/// Value source for double fields.
#[derive(Debug, Clone)]
pub struct DoubleSource {
    cells: SharedCells,
}

impl DoubleSource {
    pub fn new(cells: SharedCells) -> Self {
        Self { cells }
    }
}

impl ValueSource for DoubleSource {
    fn kind(&self) -> ValueKind {
        ValueKind::Double
    }

    fn read(
        &self,
        field: &FieldAccess<'_>,
        range: Option<&NumericRange>,
        include_source_timestamp: bool,
    ) -> Result<DataValue, StatusCode> {
        let cell = double_context(field)?;
        ensure_whole_value(range)?;
        let value = self
            .cells
            .lock()
            .and_then(|store| store.get_f64(cell))
            .map_err(|_| StatusCode::BAD_INTERNAL_ERROR)?;
        Ok(DataValue::new(value).stamped(include_source_timestamp))
    }

    fn write(
        &self,
        field: &FieldAccess<'_>,
        range: Option<&NumericRange>,
        value: &DataValue,
    ) -> Result<(), StatusCode> {
        let cell = double_context(field)?;
        let v = match incoming_scalar(range, value, ValueKind::Double)? {
            Variant::Double(v) => *v,
            _ => return Err(StatusCode::BAD_TYPE_MISMATCH),
        };
        if !v.is_finite() {
            return Err(StatusCode::BAD_OUT_OF_RANGE);
        }
        let mut store = self.cells.lock().map_err(|err| {
            warn!(field = %field.display_name(), %err, "state lock unavailable");
            StatusCode::BAD_INTERNAL_ERROR
        })?;
        store
            .set_f64(cell, v)
            .map_err(|_| StatusCode::BAD_INTERNAL_ERROR)?;
        info!(target: "audit", "write {} = {:.3}", field.display_name(), v);
        Ok(())
    }
}

/// Value source for unsigned 32-bit fields.
#[derive(Debug, Clone)]
pub struct UInt32Source {
    cells: SharedCells,
}

impl UInt32Source {
    pub fn new(cells: SharedCells) -> Self {
        Self { cells }
    }
}

impl ValueSource for UInt32Source {
    fn kind(&self) -> ValueKind {
        ValueKind::UInt32
    }

    fn read(
        &self,
        field: &FieldAccess<'_>,
        range: Option<&NumericRange>,
        include_source_timestamp: bool,
    ) -> Result<DataValue, StatusCode> {
        let cell = uint32_context(field)?;
        ensure_whole_value(range)?;
        let value = self
            .cells
            .lock()
            .and_then(|store| store.get_u32(cell))
            .map_err(|_| StatusCode::BAD_INTERNAL_ERROR)?;
        Ok(DataValue::new(value).stamped(include_source_timestamp))
    }

    fn write(
        &self,
        field: &FieldAccess<'_>,
        range: Option<&NumericRange>,
        value: &DataValue,
    ) -> Result<(), StatusCode> {
        let cell = uint32_context(field)?;
        let v = match incoming_scalar(range, value, ValueKind::UInt32)? {
            Variant::UInt32(v) => *v,
            _ => return Err(StatusCode::BAD_TYPE_MISMATCH),
        };
        let mut store = self.cells.lock().map_err(|err| {
            warn!(field = %field.display_name(), %err, "state lock unavailable");
            StatusCode::BAD_INTERNAL_ERROR
        })?;
        store
            .set_u32(cell, v)
            .map_err(|_| StatusCode::BAD_INTERNAL_ERROR)?;
        info!(target: "audit", "write {} = {}", field.display_name(), v);
        Ok(())
    }
}

/// Value source matching a cell's kind.
pub fn source_for(cell: CellRef, cells: &SharedCells) -> Box<dyn ValueSource> {
    match cell {
        CellRef::Double(_) => Box::new(DoubleSource::new(cells.clone())),
        CellRef::UInt32(_) => Box::new(UInt32Source::new(cells.clone())),
    }
}
