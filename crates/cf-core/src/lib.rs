//! cf-core: stable foundation for chemflow.
//!
//! Contains:
//! - cells (field storage shared by the address space and the process model)
//! - units (uom SI types + constructors for the plant's engineering units)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact IDs for plant entities)
//! - error (shared error types)

pub mod cells;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use cells::{CellKind, CellRef, CellStore, DoubleCell, SharedCells, UInt32Cell};
pub use error::{CfError, CfResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
