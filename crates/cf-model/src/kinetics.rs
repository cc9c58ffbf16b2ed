//! Steady-state outlet concentration of the series reaction A → B → C in a
//! continuously stirred tank.
//!
//! With rate constants `k1`, `k2` from the Arrhenius law, reactor volume `Vr`
//! and volumetric flow `Q`:
//!
//! ```text
//! CB = 2·Vr·k1·Q·CA / ((Vr·k1 + Q)·(Vr·k2 + Q))
//! ```
//!
//! Pre-exponential factors are given per minute; everything else is SI once
//! converted through `cf_core::units`.

use cf_core::units::{Temperature, Volume, VolumeRate, to_kelvin, to_m3, to_m3ps};
use cf_core::Real;
use thiserror::Error;

/// Why the equation has no value for a set of inputs.
///
/// These are ordinary operating states (closed valves, implausible
/// temperature), not failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Undefined {
    #[error("absolute temperature is not finite and positive")]
    Temperature,
    #[error("zero denominator")]
    ZeroDenominator,
}

/// Inputs of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KineticsInputs {
    pub temperature: Temperature,
    pub flow: VolumeRate,
    pub volume: Volume,
    /// Inlet concentration of A.
    pub inlet_concentration: Real,
    pub k01: Real,
    pub ea1: Real,
    pub k02: Real,
    pub ea2: Real,
    /// J/(mol·K)
    pub gas_constant: Real,
}

/// Arrhenius rate constant in 1/s from a per-minute pre-exponential factor.
pub fn rate_constant(k0_per_min: Real, activation: Real, gas_constant: Real, t_k: Real) -> Real {
    (k0_per_min / 60.0) * (-activation / (gas_constant * t_k)).exp()
}

/// Outlet concentration of B.
///
/// The result may still be negative or non-finite for extreme parameters;
/// callers decide whether it is publishable.
pub fn outlet_concentration(inputs: &KineticsInputs) -> Result<Real, Undefined> {
    let t_k = to_kelvin(inputs.temperature);
    if !t_k.is_finite() || t_k <= 0.0 {
        return Err(Undefined::Temperature);
    }

    // uom scales through its own factors, so `q` may differ from
    // `pv * 1e-3 / 60.0` in the last bit. The zero test below only cares
    // about exact zeros, which both forms preserve.
    let q = to_m3ps(inputs.flow);
    let vr = to_m3(inputs.volume);
    let k1 = rate_constant(inputs.k01, inputs.ea1, inputs.gas_constant, t_k);
    let k2 = rate_constant(inputs.k02, inputs.ea2, inputs.gas_constant, t_k);

    let a = vr * k1 + q;
    let b = vr * k2 + q;
    if a == 0.0 || b == 0.0 {
        return Err(Undefined::ZeroDenominator);
    }

    Ok(2.0 * vr * k1 * q * inputs.inlet_concentration / (a * b))
}
