//! Ionic and synaptic membrane currents of the Hodgkin Huxley model

use super::hodgkin_huxley::{HodgkinHuxleyParameters, HodgkinHuxleyState};


/// Sodium current, `g_na * m^3 * h * (V - E_na)`
pub fn sodium_current(state: &HodgkinHuxleyState, params: &HodgkinHuxleyParameters) -> f64 {
    params.g_na * state.m.powi(3) * state.h * (state.v - params.e_na)
}

/// Potassium current, `g_k * n^4 * (V - E_k)`
pub fn potassium_current(state: &HodgkinHuxleyState, params: &HodgkinHuxleyParameters) -> f64 {
    params.g_k * state.n.powi(4) * (state.v - params.e_k)
}

/// Leak current, `g_l * (V - E_l)`
pub fn leak_current(state: &HodgkinHuxleyState, params: &HodgkinHuxleyParameters) -> f64 {
    params.g_l * (state.v - params.e_l)
}

/// Synaptic current at time `t`, zero if the parameters have no synapse
pub fn synaptic_current(state: &HodgkinHuxleyState, t: f64, params: &HodgkinHuxleyParameters) -> f64 {
    params.synapse
        .as_ref()
        .map_or(0., |synapse| synapse.current(state.v, t))
}

/// Snapshot of every membrane current at one instant (µA/cm²)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MembraneCurrents {
    pub sodium: f64,
    pub potassium: f64,
    pub leak: f64,
    pub synaptic: f64,
}

impl MembraneCurrents {
    /// Calculates all currents for a given state, time, and parameter set
    pub fn compute(state: &HodgkinHuxleyState, t: f64, params: &HodgkinHuxleyParameters) -> Self {
        MembraneCurrents {
            sodium: sodium_current(state, params),
            potassium: potassium_current(state, params),
            leak: leak_current(state, params),
            synaptic: synaptic_current(state, t, params),
        }
    }

    /// Net outward current
    pub fn total(&self) -> f64 {
        self.sodium + self.potassium + self.leak + self.synaptic
    }
}
