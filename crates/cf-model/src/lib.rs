//! Process model of the reactor plant.
//!
//! This crate owns the plant entities and the numeric model that runs over
//! them on every tick:
//! - [`plant`]: sensors, actuators, the reactor and kinetics parameters,
//!   stored as cells in one [`Plant`]
//! - [`schema`]: the object types the entities are published as
//! - [`curves`]: actuator response curves
//! - [`kinetics`]: the steady-state outlet concentration
//! - [`engine`]: the periodic step tying them together
//!
//! Curve evaluation and kinetics are pure functions. The engine reads and
//! writes cells directly; client writes reach the same cells only through the
//! validating value sources of `cf-bind`.

pub mod curves;
pub mod engine;
pub mod error;
pub mod kinetics;
pub mod plant;
pub mod schema;

pub use curves::ResponseCurve;
pub use engine::{BASELINE_TEMPERATURE, Engine, RetainReason, TickOutcome, TickReport};
pub use error::{ModelError, ModelResult};
pub use kinetics::{KineticsInputs, Undefined, outlet_concentration, rate_constant};
pub use plant::{
    Actuator, KineticsConfig, KineticsValues, ModelContext, Plant, PlantBuilder, Reactor, Sensor,
};
