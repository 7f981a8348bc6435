//! Runs several parameter sets from the same initial state and time grid so their
//! trajectories can be compared, for instance excitatory against inhibitory input
//! or normal against sodium blocked membranes

use std::collections::HashSet;
use rayon::prelude::*;
use tracing::{debug, warn};
use crate::error::{InvalidInputError, SimulationError};
use crate::integrator::{simulate, SolverSettings, TimeGrid, Trajectory};
use crate::neuron::{
    hodgkin_huxley::{HodgkinHuxleyParameters, HodgkinHuxleyState},
    synapse::Synapse,
};


/// A labelled parameter set describing one simulated condition
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Name used to identify the resulting trajectory
    pub label: String,
    /// Parameters used for the run
    pub parameters: HodgkinHuxleyParameters,
}

impl Scenario {
    pub const NORMAL_LABEL: &'static str = "Normal (Excitatory)";
    pub const INHIBITORY_LABEL: &'static str = "Inhibitory Synapse";
    pub const TTX_LABEL: &'static str = "TTX (Na+ Blocked)";
    pub const ACTION_POTENTIAL_LABEL: &'static str = "Action Potential";

    pub fn new(label: &str, parameters: HodgkinHuxleyParameters) -> Self {
        Scenario { label: label.to_string(), parameters }
    }

    /// Base membrane with an excitatory synapse
    pub fn normal(base: &HodgkinHuxleyParameters) -> Self {
        Scenario::new(Self::NORMAL_LABEL, base.with_synapse(Synapse::excitatory()))
    }

    /// Base membrane with an inhibitory synapse
    pub fn inhibitory(base: &HodgkinHuxleyParameters) -> Self {
        Scenario::new(Self::INHIBITORY_LABEL, base.with_synapse(Synapse::inhibitory()))
    }

    /// Base membrane with an excitatory synapse and no sodium conductance
    pub fn ttx(base: &HodgkinHuxleyParameters) -> Self {
        Scenario::new(
            Self::TTX_LABEL,
            base.with_synapse(Synapse::excitatory()).with_sodium_blocked(),
        )
    }

    /// Base membrane driven only by the external current
    pub fn action_potential(base: &HodgkinHuxleyParameters) -> Self {
        Scenario::new(Self::ACTION_POTENTIAL_LABEL, base.without_synapse())
    }
}

/// Normal, inhibitory, and sodium blocked scenarios built from one base parameter set
pub fn reference_scenarios(base: &HodgkinHuxleyParameters) -> Vec<Scenario> {
    vec![
        Scenario::normal(base),
        Scenario::inhibitory(base),
        Scenario::ttx(base),
    ]
}

/// Outcome of every scenario keyed by label, kept in the order the scenarios were given
#[derive(Debug, Default)]
pub struct ScenarioResults {
    results: Vec<(String, Result<Trajectory, SimulationError>)>,
}

impl ScenarioResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Outcome of the scenario with the given label
    pub fn get(&self, label: &str) -> Option<&Result<Trajectory, SimulationError>> {
        self.results.iter()
            .find(|(key, _)| key == label)
            .map(|(_, result)| result)
    }

    /// Trajectory of the scenario with the given label if it succeeded
    pub fn trajectory(&self, label: &str) -> Option<&Trajectory> {
        self.get(label).and_then(|result| result.as_ref().ok())
    }

    /// Labels in run order
    pub fn labels(&self) -> Vec<&str> {
        self.results.iter()
            .map(|(label, _)| label.as_str())
            .collect()
    }

    /// Successful trajectories in run order
    pub fn successes(&self) -> Vec<(&str, &Trajectory)> {
        self.results.iter()
            .filter_map(|(label, result)| result.as_ref().ok().map(|i| (label.as_str(), i)))
            .collect()
    }

    /// Failed scenarios in run order
    pub fn failures(&self) -> Vec<(&str, &SimulationError)> {
        self.results.iter()
            .filter_map(|(label, result)| result.as_ref().err().map(|i| (label.as_str(), i)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<Trajectory, SimulationError>)> {
        self.results.iter().map(|(label, result)| (label.as_str(), result))
    }

    pub fn into_inner(self) -> Vec<(String, Result<Trajectory, SimulationError>)> {
        self.results
    }
}

/// Shared initial state, time grid, and solver settings for a batch of scenarios
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    /// State every scenario starts from
    pub initial_state: HodgkinHuxleyState,
    /// Sample times every trajectory is reported on
    pub time_grid: TimeGrid,
    /// Settings of the adaptive solver
    pub settings: SolverSettings,
    /// Whether to run scenarios on the rayon thread pool
    pub parallel: bool,
    /// Whether the first failed scenario should abort the whole run
    pub fail_fast: bool,
}

impl ScenarioRunner {
    pub fn new(initial_state: HodgkinHuxleyState, time_grid: TimeGrid) -> Self {
        ScenarioRunner {
            initial_state,
            time_grid,
            settings: SolverSettings::default(),
            parallel: true,
            fail_fast: false,
        }
    }

    fn run_scenario(&self, scenario: &Scenario) -> Result<Trajectory, SimulationError> {
        debug!(label = scenario.label.as_str(), "running scenario");

        let result = simulate(&scenario.parameters, &self.initial_state, &self.time_grid, &self.settings)
            .map_err(|e| e.in_scenario(&scenario.label));

        match &result {
            Ok(trajectory) => debug!(label = scenario.label.as_str(), samples = trajectory.len(), "scenario finished"),
            Err(e) => warn!(label = scenario.label.as_str(), error = %e, "scenario failed"),
        }

        result
    }

    /// Integrates every scenario independently, failures are collected per label unless
    /// `fail_fast` is set in which case the first failure (in scenario order) is returned
    pub fn run(&self, scenarios: &[Scenario]) -> Result<ScenarioResults, SimulationError> {
        self.initial_state.validate()?;
        self.settings.validate()?;

        let mut seen = HashSet::new();
        for scenario in scenarios {
            if !seen.insert(scenario.label.as_str()) {
                return Err(
                    InvalidInputError::DuplicateScenarioLabel { label: scenario.label.clone() }.into()
                );
            }
        }

        let outcomes: Vec<Result<Trajectory, SimulationError>> = if self.parallel {
            scenarios.par_iter()
                .map(|scenario| self.run_scenario(scenario))
                .collect()
        } else if self.fail_fast {
            let trajectories = scenarios.iter()
                .map(|scenario| self.run_scenario(scenario))
                .collect::<Result<Vec<_>, _>>()?;

            trajectories.into_iter().map(Ok).collect()
        } else {
            scenarios.iter()
                .map(|scenario| self.run_scenario(scenario))
                .collect()
        };

        let mut results = Vec::with_capacity(scenarios.len());
        for (scenario, outcome) in scenarios.iter().zip(outcomes) {
            if self.fail_fast {
                if let Err(e) = outcome {
                    return Err(e);
                }
            }
            results.push((scenario.label.clone(), outcome));
        }

        Ok(ScenarioResults { results })
    }
}
