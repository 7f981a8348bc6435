use std::time::Duration;
use thiserror::Error;


/// Error set for inputs that are rejected before any integration is attempted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInputError {
    /// Time grid has no sample points
    #[error("Time grid must contain at least one sample")]
    EmptyTimeGrid,
    /// Time grid is not strictly increasing at the given index
    #[error("Time grid must be strictly increasing (violated at index {index})")]
    NonMonotonicTimeGrid { index: usize },
    /// Time grid contains a non finite value at the given index
    #[error("Time grid must only contain finite values (violated at index {index})")]
    NonFiniteTime { index: usize },
    /// A linearly spaced grid was requested with an invalid number of samples or span
    #[error("Linearly spaced time grid requires a positive sample count and a finite span")]
    InvalidSampleCount,
    /// Initial state did not have exactly four components
    #[error("Initial state must have exactly 4 components (V, m, h, n), found {found}")]
    StateLength { found: usize },
    /// Initial state contains a non finite value
    #[error("Initial state must only contain finite values")]
    NonFiniteState,
    /// A conductance was negative
    #[error("Conductance {name} must be non-negative, found {value}")]
    NegativeConductance { name: &'static str, value: f64 },
    /// Membrane capacitance was zero or negative
    #[error("Membrane capacitance must be positive, found {value}")]
    NonPositiveCapacitance { value: f64 },
    /// A parameter was not a finite number
    #[error("Parameter {name} must be finite")]
    NonFiniteParameter { name: &'static str },
    /// A synaptic time constant was zero or negative
    #[error("Synaptic constant {name} must be positive, found {value}")]
    NonPositiveSynapticConstant { name: &'static str, value: f64 },
    /// Solver tolerances or step bounds are unusable
    #[error("Solver settings are invalid: {reason}")]
    InvalidTolerance { reason: &'static str },
    /// Two scenarios share the same label
    #[error("Scenario label \"{label}\" is used more than once")]
    DuplicateScenarioLabel { label: String },
    /// Trajectory states do not have one row per sample and four columns
    #[error("Trajectory must have {samples} rows and 4 columns, found {rows} rows and {columns} columns")]
    TrajectoryShape { rows: usize, columns: usize, samples: usize },
    /// Synapse preset name is not recognized
    #[error("Unknown synapse preset \"{name}\" (expected excitatory, inhibitory, or none)")]
    UnknownSynapsePreset { name: String },
}

/// Error set for failures that occur while integrating
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrationError {
    /// A derivative or state became non finite and smaller steps did not recover
    #[error("State diverged to non-finite values at t = {time} ms")]
    Diverged { time: f64 },
    /// Step size needed to meet tolerances fell below the minimum step
    #[error("Step size fell below the minimum allowed step at t = {time} ms")]
    StepSizeUnderflow { time: f64 },
    /// Explicit steps were limited by stability rather than accuracy
    #[error("System is stiff at t = {time} ms, explicit steps cannot make progress")]
    Stiff { time: f64 },
    /// Solver exceeded its step budget
    #[error("Maximum number of solver steps exceeded at t = {time} ms")]
    TooManySteps { time: f64 },
    /// Wall clock guard was exceeded
    #[error("Integration timed out after {elapsed:?} at t = {time} ms")]
    Timeout { time: f64, elapsed: Duration },
}

impl IntegrationError {
    /// Simulation time at which the failure was detected (ms)
    pub fn time(&self) -> f64 {
        match self {
            IntegrationError::Diverged { time }
            | IntegrationError::StepSizeUnderflow { time }
            | IntegrationError::Stiff { time }
            | IntegrationError::TooManySteps { time }
            | IntegrationError::Timeout { time, .. } => *time,
        }
    }
}

/// Error set for reading simulation configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Could not read configuration: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    /// Configuration file is not valid TOML for a simulation
    #[error("Could not parse configuration: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },
}

/// A set of errors that may occur when using the library
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Errors related to invalid inputs
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
    /// Errors related to numerical integration
    #[error(transparent)]
    Integration(#[from] IntegrationError),
    /// Errors related to configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A named scenario failed
    #[error("Scenario \"{label}\" failed: {source}")]
    Scenario {
        label: String,
        #[source]
        source: Box<SimulationError>,
    },
}

impl SimulationError {
    /// Wraps an error with the label of the scenario it came from
    pub fn in_scenario(self, label: &str) -> Self {
        SimulationError::Scenario { label: label.to_string(), source: Box::new(self) }
    }

    /// Returns the integration error at the root of this error if there is one
    pub fn integration_error(&self) -> Option<&IntegrationError> {
        match self {
            SimulationError::Integration(err) => Some(err),
            SimulationError::Scenario { source, .. } => source.integration_error(),
            _ => None,
        }
    }

    /// Returns the invalid input error at the root of this error if there is one
    pub fn invalid_input_error(&self) -> Option<&InvalidInputError> {
        match self {
            SimulationError::InvalidInput(err) => Some(err),
            SimulationError::Scenario { source, .. } => source.invalid_input_error(),
            _ => None,
        }
    }
}
