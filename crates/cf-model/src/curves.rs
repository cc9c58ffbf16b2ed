//! Actuator response curves.
//!
//! Each curve maps a manual output in percent to a process quantity:
//! quadratic from `floor` up to `floor + quad_amplitude` over `[0, 70]`,
//! then linear from `knee` to `ceiling` over `[70, 100]`. Inputs outside
//! `[0, 100]` saturate at the end values.

use cf_core::Real;
use serde::{Deserialize, Serialize};

/// Output at which the quadratic section hands over to the linear one.
pub const KNEE_INPUT: Real = 70.0;
/// Fully open.
pub const FULL_SCALE: Real = 100.0;

/// Piecewise quadratic/linear response of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseCurve {
    pub floor: Real,
    pub quad_amplitude: Real,
    pub knee: Real,
    pub ceiling: Real,
}

impl ResponseCurve {
    /// Flow valve opening to flow, L/min.
    pub const FLOW: Self = Self {
        floor: 0.0,
        quad_amplitude: 144.0,
        knee: 144.0,
        ceiling: 160.0,
    };

    /// Concentration valve opening to inlet concentration A.
    pub const CONCENTRATION: Self = Self {
        floor: 0.0,
        quad_amplitude: 0.7,
        knee: 0.7,
        ceiling: 0.9,
    };

    /// Temperature valve opening to reactor temperature, °C.
    pub const TEMPERATURE_OFFSET: Self = Self {
        floor: -8.0,
        quad_amplitude: 20.0,
        knee: 12.0,
        ceiling: 16.0,
    };

    /// Evaluate the curve at manual output `u` (percent).
    pub fn eval(&self, u: Real) -> Real {
        if u <= 0.0 {
            return self.floor;
        }
        if u >= FULL_SCALE {
            return self.ceiling;
        }
        if u <= KNEE_INPUT {
            let x = u / KNEE_INPUT;
            self.floor + self.quad_amplitude * x * x
        } else {
            let x = (u - KNEE_INPUT) / (FULL_SCALE - KNEE_INPUT);
            self.knee + (self.ceiling - self.knee) * x
        }
    }
}
