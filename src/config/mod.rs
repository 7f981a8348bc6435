//! TOML configuration of a batch of scenarios. Every field is optional and falls back
//! to the reference setup: a 0 to 50 ms grid with 10000 samples, a 10 µA/cm² stimulus,
//! and the normal, inhibitory, and sodium blocked scenarios.
//!
//! ```toml
//! initial_state = [-65.0, 0.05, 0.6, 0.32]
//! parallel = true
//!
//! [time]
//! end = 100.0
//!
//! [membrane]
//! i_ext = 6.5
//!
//! [[scenarios]]
//! label = "Blocked potassium"
//! g_k = 0.0
//! synapse = "inhibitory"
//!
//! [[scenarios]]
//! label = "Strong excitation"
//! synapse = { g_syn = 2.0, e_syn = 0.0, onset = 20.0 }
//! ```

use std::{fs::read_to_string, path::Path, time::Duration};
use serde::Deserialize;
use crate::error::{ConfigError, InvalidInputError, SimulationError};
use crate::integrator::{SolverMethod, SolverSettings, TimeGrid};
use crate::neuron::{
    hodgkin_huxley::{HodgkinHuxleyParameters, HodgkinHuxleyState},
    synapse::{Synapse, SynapticShape},
};
use crate::scenario::{reference_scenarios, Scenario, ScenarioRunner};


/// Sampling of the output time grid
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeConfig {
    /// First sample time (ms)
    pub start: f64,
    /// Last sample time (ms)
    pub end: f64,
    /// Number of samples including both ends
    pub samples: usize,
}

impl Default for TimeConfig {
    fn default() -> Self {
        TimeConfig {
            start: 0.,
            end: 50.,
            samples: 10000,
        }
    }
}

/// Overrides for any membrane parameter, unspecified fields keep their defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MembraneConfig {
    pub c_m: Option<f64>,
    pub g_na: Option<f64>,
    pub g_k: Option<f64>,
    pub g_l: Option<f64>,
    pub e_na: Option<f64>,
    pub e_k: Option<f64>,
    pub e_l: Option<f64>,
    pub i_ext: Option<f64>,
}

impl MembraneConfig {
    /// Applies the overrides on top of `base`
    pub fn apply(&self, base: HodgkinHuxleyParameters) -> HodgkinHuxleyParameters {
        HodgkinHuxleyParameters {
            c_m: self.c_m.unwrap_or(base.c_m),
            g_na: self.g_na.unwrap_or(base.g_na),
            g_k: self.g_k.unwrap_or(base.g_k),
            g_l: self.g_l.unwrap_or(base.g_l),
            e_na: self.e_na.unwrap_or(base.e_na),
            e_k: self.e_k.unwrap_or(base.e_k),
            e_l: self.e_l.unwrap_or(base.e_l),
            i_ext: self.i_ext.unwrap_or(base.i_ext),
            synapse: base.synapse,
        }
    }
}

/// Solver settings, unspecified fields keep their defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub rtol: Option<f64>,
    pub atol: Option<f64>,
    pub initial_step: Option<f64>,
    pub min_step: Option<f64>,
    pub max_step: Option<f64>,
    pub max_steps: Option<usize>,
    /// Wall clock limit per scenario (ms)
    pub timeout_ms: Option<u64>,
    /// `"auto"`, `"dormand_prince"`, or `"rosenbrock"`
    pub method: Option<SolverMethod>,
}

impl SolverConfig {
    pub fn to_settings(&self) -> SolverSettings {
        let defaults = SolverSettings::default();

        SolverSettings {
            rtol: self.rtol.unwrap_or(defaults.rtol),
            atol: self.atol.unwrap_or(defaults.atol),
            initial_step: self.initial_step.unwrap_or(defaults.initial_step),
            min_step: self.min_step.unwrap_or(defaults.min_step),
            max_step: self.max_step.unwrap_or(defaults.max_step),
            max_steps: self.max_steps.unwrap_or(defaults.max_steps),
            timeout: self.timeout_ms.map(Duration::from_millis).or(defaults.timeout),
            method: self.method.unwrap_or(defaults.method),
        }
    }
}

/// Explicit synapse, unspecified fields fall back to the excitatory preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynapseTable {
    pub g_syn: Option<f64>,
    pub e_syn: Option<f64>,
    pub onset: Option<f64>,
    pub t_peak: Option<f64>,
    pub decay: Option<f64>,
}

/// Synapse of a scenario, either a preset name or a table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SynapseConfig {
    /// `"excitatory"`, `"inhibitory"`, or `"none"`
    Preset(String),
    Table(SynapseTable),
}

impl SynapseConfig {
    pub fn to_synapse(&self) -> Result<Option<Synapse>, InvalidInputError> {
        match self {
            SynapseConfig::Preset(name) => match name.to_lowercase().as_str() {
                "excitatory" => Ok(Some(Synapse::excitatory())),
                "inhibitory" => Ok(Some(Synapse::inhibitory())),
                "none" => Ok(None),
                _ => Err(InvalidInputError::UnknownSynapsePreset { name: name.clone() }),
            },
            SynapseConfig::Table(table) => {
                let preset = Synapse::excitatory();

                Ok(Some(Synapse {
                    g_syn: table.g_syn.unwrap_or(preset.g_syn),
                    e_syn: table.e_syn.unwrap_or(preset.e_syn),
                    onset: table.onset.unwrap_or(preset.onset),
                    shape: SynapticShape {
                        t_peak: table.t_peak.unwrap_or(preset.shape.t_peak),
                        decay: table.decay.unwrap_or(preset.shape.decay),
                    },
                }))
            }
        }
    }
}

/// One scenario, membrane overrides apply on top of the global `[membrane]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    pub label: String,
    pub c_m: Option<f64>,
    pub g_na: Option<f64>,
    pub g_k: Option<f64>,
    pub g_l: Option<f64>,
    pub e_na: Option<f64>,
    pub e_k: Option<f64>,
    pub e_l: Option<f64>,
    pub i_ext: Option<f64>,
    pub synapse: Option<SynapseConfig>,
}

impl ScenarioConfig {
    /// Membrane overrides of this scenario
    pub fn membrane(&self) -> MembraneConfig {
        MembraneConfig {
            c_m: self.c_m,
            g_na: self.g_na,
            g_k: self.g_k,
            g_l: self.g_l,
            e_na: self.e_na,
            e_k: self.e_k,
            e_l: self.e_l,
            i_ext: self.i_ext,
        }
    }
}

/// Complete configuration of a simulation batch
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Starting `[V, m, h, n]`
    pub initial_state: Vec<f64>,
    pub time: TimeConfig,
    pub membrane: MembraneConfig,
    pub solver: SolverConfig,
    /// Scenarios to run, empty means the reference scenarios
    pub scenarios: Vec<ScenarioConfig>,
    pub parallel: bool,
    pub fail_fast: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            initial_state: HodgkinHuxleyState::default().to_array().to_vec(),
            time: TimeConfig::default(),
            membrane: MembraneConfig::default(),
            solver: SolverConfig::default(),
            scenarios: vec![],
            parallel: true,
            fail_fast: false,
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = read_to_string(path)?;

        SimulationConfig::from_toml_str(&content)
    }

    pub fn time_grid(&self) -> Result<TimeGrid, InvalidInputError> {
        TimeGrid::linspace(self.time.start, self.time.end, self.time.samples)
    }

    pub fn initial_state(&self) -> Result<HodgkinHuxleyState, InvalidInputError> {
        HodgkinHuxleyState::from_slice(&self.initial_state)
    }

    /// Membrane parameters shared by every scenario before per scenario overrides
    pub fn base_parameters(&self) -> HodgkinHuxleyParameters {
        self.membrane.apply(HodgkinHuxleyParameters::default())
    }

    /// Scenarios described by the configuration
    pub fn scenarios(&self) -> Result<Vec<Scenario>, InvalidInputError> {
        let base = self.base_parameters();
        if self.scenarios.is_empty() {
            return Ok(reference_scenarios(&base));
        }

        self.scenarios.iter()
            .map(|scenario| {
                let mut parameters = scenario.membrane().apply(base);
                if let Some(synapse) = &scenario.synapse {
                    parameters.synapse = synapse.to_synapse()?;
                }

                Ok(Scenario::new(&scenario.label, parameters))
            })
            .collect()
    }

    /// Runner configured with the grid, initial state, and solver settings
    pub fn runner(&self) -> Result<ScenarioRunner, SimulationError> {
        let mut runner = ScenarioRunner::new(self.initial_state()?, self.time_grid()?);
        runner.settings = self.solver.to_settings();
        runner.parallel = self.parallel;
        runner.fail_fast = self.fail_fast;

        Ok(runner)
    }
}
