//! Field storage: plain scalar cells owned by the plant.
//!
//! Every exposed field of every entity lives in exactly one cell. Cells are
//! addressed by small copyable handles instead of pointers, so the same
//! handle can be held by the process model and by an address-space binding.
//!
//! A [`SharedCells`] is the single model-state lock: the periodic tick and
//! every protocol-facing read/write go through it, which keeps field access
//! serialized even on a multi-threaded dispatcher.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{CfError, CfResult};

/// Handle to a double-precision cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DoubleCell(u32);

/// Handle to an unsigned 32-bit cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UInt32Cell(u32);

/// Value kind stored in a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    Double,
    UInt32,
}

/// Any cell, regardless of kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellRef {
    Double(DoubleCell),
    UInt32(UInt32Cell),
}

impl CellRef {
    pub fn kind(self) -> CellKind {
        match self {
            CellRef::Double(_) => CellKind::Double,
            CellRef::UInt32(_) => CellKind::UInt32,
        }
    }
}

impl From<DoubleCell> for CellRef {
    fn from(cell: DoubleCell) -> Self {
        CellRef::Double(cell)
    }
}

impl From<UInt32Cell> for CellRef {
    fn from(cell: UInt32Cell) -> Self {
        CellRef::UInt32(cell)
    }
}

/// Dense storage for all plant fields.
#[derive(Debug, Default, Clone)]
pub struct CellStore {
    doubles: Vec<f64>,
    uints: Vec<u32>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a double cell with an initial value.
    pub fn alloc_f64(&mut self, initial: f64) -> DoubleCell {
        let cell = DoubleCell(self.doubles.len() as u32);
        self.doubles.push(initial);
        cell
    }

    /// Allocate an unsigned cell with an initial value.
    pub fn alloc_u32(&mut self, initial: u32) -> UInt32Cell {
        let cell = UInt32Cell(self.uints.len() as u32);
        self.uints.push(initial);
        cell
    }

    pub fn get_f64(&self, cell: DoubleCell) -> CfResult<f64> {
        self.doubles
            .get(cell.0 as usize)
            .copied()
            .ok_or(CfError::IndexOob {
                what: "double cell",
                index: cell.0 as usize,
                len: self.doubles.len(),
            })
    }

    pub fn set_f64(&mut self, cell: DoubleCell, value: f64) -> CfResult<()> {
        let len = self.doubles.len();
        let slot = self
            .doubles
            .get_mut(cell.0 as usize)
            .ok_or(CfError::IndexOob {
                what: "double cell",
                index: cell.0 as usize,
                len,
            })?;
        *slot = value;
        Ok(())
    }

    pub fn get_u32(&self, cell: UInt32Cell) -> CfResult<u32> {
        self.uints
            .get(cell.0 as usize)
            .copied()
            .ok_or(CfError::IndexOob {
                what: "uint32 cell",
                index: cell.0 as usize,
                len: self.uints.len(),
            })
    }

    pub fn set_u32(&mut self, cell: UInt32Cell, value: u32) -> CfResult<()> {
        let len = self.uints.len();
        let slot = self
            .uints
            .get_mut(cell.0 as usize)
            .ok_or(CfError::IndexOob {
                what: "uint32 cell",
                index: cell.0 as usize,
                len,
            })?;
        *slot = value;
        Ok(())
    }

    /// Number of allocated cells of both kinds.
    pub fn len(&self) -> usize {
        self.doubles.len() + self.uints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cell store behind the model-state lock.
#[derive(Debug, Clone, Default)]
pub struct SharedCells(Arc<Mutex<CellStore>>);

impl SharedCells {
    pub fn new(store: CellStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    /// Acquire the model-state lock.
    pub fn lock(&self) -> CfResult<MutexGuard<'_, CellStore>> {
        self.0.lock().map_err(|_| CfError::Poisoned {
            what: "cell store",
        })
    }
}
