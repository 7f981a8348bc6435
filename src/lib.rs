//! # Hodgkin Huxley Synapse
//!
//! `hodgkin_huxley_synapse` simulates the membrane potential of a single Hodgkin
//! Huxley neuron driven by an external current and an optional time locked synapse.
//! It is meant for comparing how the same membrane responds to excitatory input,
//! inhibitory input, and sodium channel block (tetrodotoxin).
//!
//! The model is written as an ordinary differential equation system over
//! `[V, m, h, n]` and integrated with an adaptive Dormand-Prince solver, outputs
//! are reported on a user chosen time grid.
//!
//! ## Example Code
//!
//! ### Running the reference scenarios
//!
//! ```rust
//! use hodgkin_huxley_synapse::{
//!     error::SimulationError,
//!     integrator::TimeGrid,
//!     neuron::hodgkin_huxley::{HodgkinHuxleyParameters, HodgkinHuxleyState},
//!     scenario::{reference_scenarios, Scenario, ScenarioRunner},
//!     analysis::peak_voltage,
//! };
//!
//! fn main() -> Result<(), SimulationError> {
//!     // 0 to 50 ms sampled 1000 times
//!     let grid = TimeGrid::linspace(0., 50., 1000)?;
//!     let runner = ScenarioRunner::new(HodgkinHuxleyState::default(), grid);
//!
//!     // normal, inhibitory, and sodium blocked conditions with a 10 µA/cm² stimulus
//!     let scenarios = reference_scenarios(&HodgkinHuxleyParameters::default());
//!     let results = runner.run(&scenarios)?;
//!
//!     let normal = results.trajectory(Scenario::NORMAL_LABEL).expect("normal scenario ran");
//!     let ttx = results.trajectory(Scenario::TTX_LABEL).expect("ttx scenario ran");
//!
//!     // blocking sodium channels removes the action potential
//!     assert!(peak_voltage(normal.voltages()).unwrap() > 0.);
//!     assert!(peak_voltage(ttx.voltages()).unwrap() < 0.);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Custom `OdeSystem` implementation
//!
//! ```rust
//! use hodgkin_huxley_synapse::integrator::{integrate, OdeSystem, SolverSettings, TimeGrid};
//!
//! /// Membrane with only a leak conductance, relaxes exponentially to `e_l`
//! struct PassiveMembrane {
//!     g_l: f64,
//!     e_l: f64,
//!     c_m: f64,
//! }
//!
//! impl OdeSystem<1> for PassiveMembrane {
//!     fn derivatives(&self, _t: f64, y: &[f64; 1]) -> [f64; 1] {
//!         [-self.g_l * (y[0] - self.e_l) / self.c_m]
//!     }
//! }
//!
//! let membrane = PassiveMembrane { g_l: 0.3, e_l: -54.4, c_m: 1. };
//! let grid = TimeGrid::linspace(0., 100., 101).unwrap();
//! let states = integrate(&membrane, [-65.], &grid, &SolverSettings::default()).unwrap();
//!
//! assert!((states[[100, 0]] - -54.4).abs() < 1e-3);
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod integrator;
pub mod neuron;
pub mod output;
pub mod scenario;
