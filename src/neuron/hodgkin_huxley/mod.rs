//! The Hodgkin Huxley membrane as an ordinary differential equation system
//! over the state `[V, m, h, n]`, with an optional time locked synapse

use crate::error::InvalidInputError;
use crate::integrator::OdeSystem;
use super::gating::{steady_state_gates, GatingVariable};
use super::ion_channels::MembraneCurrents;
use super::synapse::Synapse;


/// State of the membrane at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HodgkinHuxleyState {
    /// Membrane potential (mV)
    pub v: f64,
    /// Sodium activation
    pub m: f64,
    /// Sodium inactivation
    pub h: f64,
    /// Potassium activation
    pub n: f64,
}

impl Default for HodgkinHuxleyState {
    fn default() -> Self {
        HodgkinHuxleyState {
            v: -65.,
            m: 0.05,
            h: 0.6,
            n: 0.32,
        }
    }
}

impl HodgkinHuxleyState {
    /// Creates a state from a slice of `[V, m, h, n]`, the slice must have
    /// exactly four finite components
    pub fn from_slice(values: &[f64]) -> Result<Self, InvalidInputError> {
        let array: [f64; 4] = values.try_into()
            .map_err(|_| InvalidInputError::StateLength { found: values.len() })?;

        let state = HodgkinHuxleyState::from(array);
        state.validate()?;

        Ok(state)
    }

    /// Checks that every component is finite
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if self.to_array().iter().any(|i| !i.is_finite()) {
            return Err(InvalidInputError::NonFiniteState);
        }

        Ok(())
    }

    /// State at the given voltage with every gate at its steady state
    pub fn resting(voltage: f64) -> Self {
        let (m, h, n) = steady_state_gates(voltage);

        HodgkinHuxleyState { v: voltage, m, h, n }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.v, self.m, self.h, self.n]
    }

    /// Whether every gating variable lies within `[0, 1]`
    pub fn gating_in_bounds(&self) -> bool {
        [self.m, self.h, self.n].iter()
            .all(|i| (0. ..=1.).contains(i))
    }
}

impl From<[f64; 4]> for HodgkinHuxleyState {
    fn from(values: [f64; 4]) -> Self {
        HodgkinHuxleyState {
            v: values[0],
            m: values[1],
            h: values[2],
            n: values[3],
        }
    }
}

impl From<HodgkinHuxleyState> for [f64; 4] {
    fn from(state: HodgkinHuxleyState) -> Self {
        state.to_array()
    }
}

/// Conductances, reversal potentials, and drive of one simulated condition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HodgkinHuxleyParameters {
    /// Membrane capacitance (µF/cm²)
    pub c_m: f64,
    /// Maximal sodium conductance (mS/cm²)
    pub g_na: f64,
    /// Maximal potassium conductance (mS/cm²)
    pub g_k: f64,
    /// Leak conductance (mS/cm²)
    pub g_l: f64,
    /// Sodium reversal potential (mV)
    pub e_na: f64,
    /// Potassium reversal potential (mV)
    pub e_k: f64,
    /// Leak reversal potential (mV)
    pub e_l: f64,
    /// External stimulus current (µA/cm²)
    pub i_ext: f64,
    /// Optional synaptic input
    pub synapse: Option<Synapse>,
}

impl Default for HodgkinHuxleyParameters {
    fn default() -> Self {
        HodgkinHuxleyParameters {
            c_m: 1.,
            g_na: 120.,
            g_k: 36.,
            g_l: 0.3,
            e_na: 50.,
            e_k: -77.,
            e_l: -54.4,
            i_ext: 10.,
            synapse: None,
        }
    }
}

impl HodgkinHuxleyParameters {
    /// Returns a copy with the given synapse
    pub fn with_synapse(self, synapse: Synapse) -> Self {
        HodgkinHuxleyParameters { synapse: Some(synapse), ..self }
    }

    /// Returns a copy without synaptic input
    pub fn without_synapse(self) -> Self {
        HodgkinHuxleyParameters { synapse: None, ..self }
    }

    /// Returns a copy with the sodium conductance removed, emulating tetrodotoxin
    pub fn with_sodium_blocked(self) -> Self {
        HodgkinHuxleyParameters { g_na: 0., ..self }
    }

    /// Returns a copy with a different external stimulus
    pub fn with_external_current(self, i_ext: f64) -> Self {
        HodgkinHuxleyParameters { i_ext, ..self }
    }

    /// Checks that the parameter set describes a physically meaningful membrane
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        let mut finite = vec![
            ("c_m", self.c_m), ("g_na", self.g_na), ("g_k", self.g_k), ("g_l", self.g_l),
            ("e_na", self.e_na), ("e_k", self.e_k), ("e_l", self.e_l), ("i_ext", self.i_ext),
        ];
        if let Some(synapse) = &self.synapse {
            finite.extend([
                ("g_syn", synapse.g_syn), ("e_syn", synapse.e_syn), ("onset", synapse.onset),
                ("t_peak", synapse.shape.t_peak), ("decay", synapse.shape.decay),
            ]);
        }
        if let Some((name, _)) = finite.into_iter().find(|(_, value)| !value.is_finite()) {
            return Err(InvalidInputError::NonFiniteParameter { name });
        }

        if self.c_m <= 0. {
            return Err(InvalidInputError::NonPositiveCapacitance { value: self.c_m });
        }

        let mut conductances = vec![("g_na", self.g_na), ("g_k", self.g_k), ("g_l", self.g_l)];
        if let Some(synapse) = &self.synapse {
            conductances.push(("g_syn", synapse.g_syn));
        }
        if let Some((name, value)) = conductances.into_iter().find(|(_, value)| *value < 0.) {
            return Err(InvalidInputError::NegativeConductance { name, value });
        }

        if let Some(synapse) = &self.synapse {
            for (name, value) in [("t_peak", synapse.shape.t_peak), ("decay", synapse.shape.decay)] {
                if value <= 0. {
                    return Err(InvalidInputError::NonPositiveSynapticConstant { name, value });
                }
            }
        }

        Ok(())
    }
}

/// Calculates `[dV/dt, dm/dt, dh/dt, dn/dt]` for the given state at time `t`
pub fn derivatives(state: &HodgkinHuxleyState, t: f64, params: &HodgkinHuxleyParameters) -> [f64; 4] {
    let currents = MembraneCurrents::compute(state, t, params);
    let dv = (params.i_ext - currents.total()) / params.c_m;

    [
        dv,
        GatingVariable::M.derivative(state.v, state.m),
        GatingVariable::H.derivative(state.v, state.h),
        GatingVariable::N.derivative(state.v, state.n),
    ]
}

impl OdeSystem<4> for HodgkinHuxleyParameters {
    fn derivatives(&self, t: f64, y: &[f64; 4]) -> [f64; 4] {
        derivatives(&HodgkinHuxleyState::from(*y), t, self)
    }
}

/// Holds voltage fixed so that only the gates evolve, the first
/// component of the state is left unchanged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageClamp {
    /// Command voltage (mV)
    pub voltage: f64,
}

impl OdeSystem<4> for VoltageClamp {
    fn derivatives(&self, _t: f64, y: &[f64; 4]) -> [f64; 4] {
        [
            0.,
            GatingVariable::M.derivative(self.voltage, y[1]),
            GatingVariable::H.derivative(self.voltage, y[2]),
            GatingVariable::N.derivative(self.voltage, y[3]),
        ]
    }
}
