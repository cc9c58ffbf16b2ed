//! The plant: every process entity and the cells holding their fields.
//!
//! The [`Plant`] is the single owner of model state. Entities are created once
//! through a [`PlantBuilder`] and never removed; only cell values change
//! afterwards. Everything else refers to entities by [`Id`] and to fields by
//! cell handle.

use cf_bind::FieldBacking;
use cf_core::units::constants::R_J_PER_MOL_K;
use cf_core::{
    ActuatorId, CellRef, CellStore, DoubleCell, Id, Real, ReactorId, SensorId, SharedCells,
    UInt32Cell, ensure_finite,
};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::schema::fields;

/// A measured or derived process value. Read-only for clients.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub name: String,
    pub process_value: DoubleCell,
}

/// A valve handle. Clients write the manual output in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct Actuator {
    pub name: String,
    pub manual_output: DoubleCell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reactor {
    pub name: String,
    /// Liters.
    pub volume: DoubleCell,
}

/// Cells of the kinetics parameters.
///
/// The gas constant is fixed at build time and not exposed to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct KineticsConfig {
    pub name: String,
    pub substance_id: UInt32Cell,
    pub k01: DoubleCell,
    pub ea1: DoubleCell,
    pub k02: DoubleCell,
    pub ea2: DoubleCell,
    pub gas_constant: Real,
}

/// Initial kinetics parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticsValues {
    pub substance_id: u32,
    pub k01: Real,
    pub ea1: Real,
    pub k02: Real,
    pub ea2: Real,
    pub gas_constant: Real,
}

impl Default for KineticsValues {
    fn default() -> Self {
        Self {
            substance_id: 0,
            k01: 0.0,
            ea1: 0.0,
            k02: 0.0,
            ea2: 0.0,
            gas_constant: R_J_PER_MOL_K,
        }
    }
}

impl FieldBacking for Sensor {
    fn cell(&self, field: &str) -> Option<CellRef> {
        (field == fields::PROCESS_VALUE).then(|| self.process_value.into())
    }
}

impl FieldBacking for Actuator {
    fn cell(&self, field: &str) -> Option<CellRef> {
        (field == fields::MANUAL_OUTPUT).then(|| self.manual_output.into())
    }
}

impl FieldBacking for Reactor {
    fn cell(&self, field: &str) -> Option<CellRef> {
        (field == fields::REACTOR_VOLUME).then(|| self.volume.into())
    }
}

impl FieldBacking for KineticsConfig {
    fn cell(&self, field: &str) -> Option<CellRef> {
        match field {
            fields::SUBSTANCE_ID => Some(self.substance_id.into()),
            fields::K01 => Some(self.k01.into()),
            fields::K02 => Some(self.k02.into()),
            fields::EA1 => Some(self.ea1.into()),
            fields::EA2 => Some(self.ea2.into()),
            _ => None,
        }
    }
}

/// Collects entities and allocates their cells.
#[derive(Debug)]
pub struct PlantBuilder {
    store: CellStore,
    sensors: Vec<Sensor>,
    actuators: Vec<Actuator>,
    reactors: Vec<Reactor>,
    kinetics: KineticsConfig,
}

impl PlantBuilder {
    pub fn new(config_name: impl Into<String>, kinetics: KineticsValues) -> Self {
        let mut store = CellStore::new();
        let kinetics = KineticsConfig {
            name: config_name.into(),
            substance_id: store.alloc_u32(kinetics.substance_id),
            k01: store.alloc_f64(kinetics.k01),
            ea1: store.alloc_f64(kinetics.ea1),
            k02: store.alloc_f64(kinetics.k02),
            ea2: store.alloc_f64(kinetics.ea2),
            gas_constant: kinetics.gas_constant,
        };
        Self {
            store,
            sensors: Vec::new(),
            actuators: Vec::new(),
            reactors: Vec::new(),
            kinetics,
        }
    }

    /// Add a sensor reading zero.
    pub fn sensor(&mut self, name: impl Into<String>) -> SensorId {
        let id = Id::from_index(self.sensors.len() as u32);
        self.sensors.push(Sensor {
            name: name.into(),
            process_value: self.store.alloc_f64(0.0),
        });
        id
    }

    /// Add an actuator at `initial` percent.
    pub fn actuator(&mut self, name: impl Into<String>, initial: Real) -> ActuatorId {
        let id = Id::from_index(self.actuators.len() as u32);
        self.actuators.push(Actuator {
            name: name.into(),
            manual_output: self.store.alloc_f64(initial),
        });
        id
    }

    /// Add a reactor of `volume` liters.
    pub fn reactor(&mut self, name: impl Into<String>, volume: Real) -> ReactorId {
        let id = Id::from_index(self.reactors.len() as u32);
        self.reactors.push(Reactor {
            name: name.into(),
            volume: self.store.alloc_f64(volume),
        });
        id
    }

    pub fn build(self) -> Plant {
        Plant {
            cells: SharedCells::new(self.store),
            sensors: self.sensors,
            actuators: self.actuators,
            reactors: self.reactors,
            kinetics: self.kinetics,
        }
    }
}

/// Owner of all process entities and the model-state lock.
#[derive(Debug, Clone)]
pub struct Plant {
    cells: SharedCells,
    sensors: Vec<Sensor>,
    actuators: Vec<Actuator>,
    reactors: Vec<Reactor>,
    kinetics: KineticsConfig,
}

fn lookup<'a, T>(items: &'a [T], id: Id, what: &'static str) -> ModelResult<&'a T> {
    items
        .get(id.slot())
        .ok_or(ModelError::UnknownEntity { what, id })
}

impl Plant {
    pub fn cells(&self) -> &SharedCells {
        &self.cells
    }

    pub fn sensor(&self, id: SensorId) -> ModelResult<&Sensor> {
        lookup(&self.sensors, id, "sensor")
    }

    pub fn actuator(&self, id: ActuatorId) -> ModelResult<&Actuator> {
        lookup(&self.actuators, id, "actuator")
    }

    pub fn reactor(&self, id: ReactorId) -> ModelResult<&Reactor> {
        lookup(&self.reactors, id, "reactor")
    }

    pub fn kinetics(&self) -> &KineticsConfig {
        &self.kinetics
    }

    pub fn sensors(&self) -> impl Iterator<Item = (SensorId, &Sensor)> {
        self.sensors
            .iter()
            .enumerate()
            .map(|(i, s)| (Id::from_index(i as u32), s))
    }

    pub fn actuators(&self) -> impl Iterator<Item = (ActuatorId, &Actuator)> {
        self.actuators
            .iter()
            .enumerate()
            .map(|(i, a)| (Id::from_index(i as u32), a))
    }

    pub fn reactors(&self) -> impl Iterator<Item = (ReactorId, &Reactor)> {
        self.reactors
            .iter()
            .enumerate()
            .map(|(i, r)| (Id::from_index(i as u32), r))
    }

    /// Current value of a sensor.
    pub fn process_value(&self, id: SensorId) -> ModelResult<Real> {
        let cell = self.sensor(id)?.process_value;
        Ok(self.cells.lock()?.get_f64(cell)?)
    }

    /// Set an actuator's manual output from inside the process. Non-finite values are rejected.
    pub fn set_manual_output(&self, id: ActuatorId, value: Real) -> ModelResult<()> {
        let cell = self.actuator(id)?.manual_output;
        let value = ensure_finite(value, "manual output")?;
        self.cells.lock()?.set_f64(cell, value)?;
        Ok(())
    }
}

/// The entities the process model works on.
///
/// Handles only; the plant owns the storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelContext {
    pub reactor: ReactorId,
    pub flow_sensor: SensorId,
    pub temperature_sensor: SensorId,
    pub inlet_sensor: SensorId,
    pub outlet_sensor: SensorId,
    pub concentration_valve: ActuatorId,
    pub flow_valve: ActuatorId,
    pub temperature_valve: ActuatorId,
}

/// A [`ModelContext`] resolved to cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ContextCells {
    pub volume: DoubleCell,
    pub flow_sensor: DoubleCell,
    pub temperature_sensor: DoubleCell,
    pub inlet_sensor: DoubleCell,
    pub outlet_sensor: DoubleCell,
    pub concentration_valve: DoubleCell,
    pub flow_valve: DoubleCell,
    pub temperature_valve: DoubleCell,
}

impl ModelContext {
    pub(crate) fn resolve(&self, plant: &Plant) -> ModelResult<ContextCells> {
        Ok(ContextCells {
            volume: plant.reactor(self.reactor)?.volume,
            flow_sensor: plant.sensor(self.flow_sensor)?.process_value,
            temperature_sensor: plant.sensor(self.temperature_sensor)?.process_value,
            inlet_sensor: plant.sensor(self.inlet_sensor)?.process_value,
            outlet_sensor: plant.sensor(self.outlet_sensor)?.process_value,
            concentration_valve: plant.actuator(self.concentration_valve)?.manual_output,
            flow_valve: plant.actuator(self.flow_valve)?.manual_output,
            temperature_valve: plant.actuator(self.temperature_valve)?.manual_output,
        })
    }

    /// Check every handle against `plant`.
    pub fn validate(&self, plant: &Plant) -> ModelResult<()> {
        self.resolve(plant).map(|_| ())
    }
}
