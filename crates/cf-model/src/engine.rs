//! The periodic process model step.
//!
//! One tick, in order:
//! 1. flow valve output → flow sensor through [`ResponseCurve::FLOW`]
//! 2. concentration valve output → inlet sensor through
//!    [`ResponseCurve::CONCENTRATION`]
//! 3. with the concentration valve exactly at zero the temperature sensor is
//!    forced to [`BASELINE_TEMPERATURE`], otherwise the temperature valve
//!    output goes through [`ResponseCurve::TEMPERATURE_OFFSET`]
//! 4. the outlet concentration is evaluated from the sensors just written, the
//!    reactor volume and the kinetics parameters
//! 5. the outlet sensor is written only with a finite, non-negative result
//!
//! The tick works on cells directly and holds the plant lock throughout, so
//! no client request interleaves with it.

use cf_core::units::{degc, liters, lpm};
use cf_core::{Real, is_publishable};
use tracing::trace;

use crate::curves::ResponseCurve;
use crate::error::ModelResult;
use crate::kinetics::{KineticsInputs, Undefined, outlet_concentration};
use crate::plant::{ModelContext, Plant};

/// Temperature reported while no reactant is fed, °C.
pub const BASELINE_TEMPERATURE: Real = 0.0;

/// Why the outlet sensor kept its previous value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetainReason {
    Undefined(Undefined),
    /// A value was computed but is negative or not finite.
    NotPublishable(Real),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Published(Real),
    Retained(RetainReason),
}

impl TickOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, TickOutcome::Published(_))
    }
}

/// Values written by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub flow: Real,
    pub inlet_concentration: Real,
    pub temperature: Real,
    pub outlet: TickOutcome,
}

/// Runs the process model over the entities of a [`ModelContext`].
#[derive(Debug, Clone)]
pub struct Engine {
    context: ModelContext,
}

impl Engine {
    pub fn new(context: ModelContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ModelContext {
        &self.context
    }

    /// Run one step against `plant`.
    ///
    /// Errors only on storage faults; undefined kinetics are reported in
    /// [`TickReport::outlet`].
    pub fn tick(&self, plant: &Plant) -> ModelResult<TickReport> {
        let c = self.context.resolve(plant)?;
        let kinetics = plant.kinetics();
        let mut cells = plant.cells().lock()?;

        let flow = ResponseCurve::FLOW.eval(cells.get_f64(c.flow_valve)?);
        cells.set_f64(c.flow_sensor, flow)?;

        let feed = cells.get_f64(c.concentration_valve)?;
        let inlet_concentration = ResponseCurve::CONCENTRATION.eval(feed);
        cells.set_f64(c.inlet_sensor, inlet_concentration)?;

        let temperature = if feed == 0.0 {
            BASELINE_TEMPERATURE
        } else {
            ResponseCurve::TEMPERATURE_OFFSET.eval(cells.get_f64(c.temperature_valve)?)
        };
        cells.set_f64(c.temperature_sensor, temperature)?;

        let inputs = KineticsInputs {
            temperature: degc(cells.get_f64(c.temperature_sensor)?),
            flow: lpm(cells.get_f64(c.flow_sensor)?),
            volume: liters(cells.get_f64(c.volume)?),
            inlet_concentration: cells.get_f64(c.inlet_sensor)?,
            k01: cells.get_f64(kinetics.k01)?,
            ea1: cells.get_f64(kinetics.ea1)?,
            k02: cells.get_f64(kinetics.k02)?,
            ea2: cells.get_f64(kinetics.ea2)?,
            gas_constant: kinetics.gas_constant,
        };

        let outlet = match outlet_concentration(&inputs) {
            Ok(cb) if is_publishable(cb) => {
                cells.set_f64(c.outlet_sensor, cb)?;
                TickOutcome::Published(cb)
            }
            Ok(cb) => {
                trace!(cb, "outlet concentration not publishable");
                TickOutcome::Retained(RetainReason::NotPublishable(cb))
            }
            Err(reason) => {
                trace!(%reason, "outlet concentration undefined");
                TickOutcome::Retained(RetainReason::Undefined(reason))
            }
        };

        Ok(TickReport {
            flow,
            inlet_concentration,
            temperature,
            outlet,
        })
    }
}
