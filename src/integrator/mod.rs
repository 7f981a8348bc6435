//! Adaptive time integration of small ordinary differential equation systems.
//!
//! Integration uses the embedded Dormand-Prince 5(4) Runge-Kutta pair with local
//! error control. Internal steps are chosen adaptively and clipped so the solver
//! lands exactly on every requested output time, so a fine output grid does not
//! force small steps during slow recovery and a coarse grid does not skip over spikes.
//!
//! Explicit steps estimate the dominant eigenvalue of the Jacobian from their last two
//! stages. When accepted steps keep sitting at the stability boundary the system is
//! treated as stiff, and [`SolverMethod::Auto`] continues with a linearly implicit
//! Rosenbrock 2(3) method that uses a finite difference Jacobian.

use std::time::{Duration, Instant};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::Deserialize;
use tracing::debug;
use crate::error::{IntegrationError, InvalidInputError, SimulationError};
use crate::neuron::hodgkin_huxley::{HodgkinHuxleyParameters, HodgkinHuxleyState};


/// A system of `N` first order differential equations, `dy/dt = f(t, y)`
///
/// Implementations must be pure, the solver evaluates them at arbitrary
/// times between output samples and may evaluate the same time more than once
pub trait OdeSystem<const N: usize> {
    /// Returns the time derivative of every component of `y` at time `t`
    fn derivatives(&self, t: f64, y: &[f64; N]) -> [f64; N];
}

/// Ordered, strictly increasing sample times (ms)
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
}

impl TimeGrid {
    /// Creates a grid from sample times, times must be finite and strictly increasing
    pub fn new(times: Vec<f64>) -> Result<Self, InvalidInputError> {
        if times.is_empty() {
            return Err(InvalidInputError::EmptyTimeGrid);
        }
        if let Some(index) = times.iter().position(|i| !i.is_finite()) {
            return Err(InvalidInputError::NonFiniteTime { index });
        }
        if let Some(index) = (1..times.len()).find(|&i| times[i] <= times[i - 1]) {
            return Err(InvalidInputError::NonMonotonicTimeGrid { index });
        }

        Ok(TimeGrid { times })
    }

    /// Creates `samples` evenly spaced times from `start` to `end` inclusive
    pub fn linspace(start: f64, end: f64, samples: usize) -> Result<Self, InvalidInputError> {
        if samples == 0 || !start.is_finite() || !end.is_finite() {
            return Err(InvalidInputError::InvalidSampleCount);
        }
        if samples == 1 {
            return TimeGrid::new(vec![start]);
        }

        let step = (end - start) / (samples - 1) as f64;
        let mut times: Vec<f64> = (0..samples)
            .map(|i| start + step * i as f64)
            .collect();
        times[samples - 1] = end;

        TimeGrid::new(times)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.times[0]
    }

    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.times
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.times.iter()
    }
}

/// Stepping scheme used by [`integrate`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethod {
    /// Explicit Dormand-Prince steps until the system turns out to be stiff,
    /// then linearly implicit Rosenbrock steps for the rest of the integration
    #[default]
    Auto,
    /// Explicit Dormand-Prince steps only, stiffness is reported as an error
    DormandPrince,
    /// Linearly implicit Rosenbrock steps only
    Rosenbrock,
}

/// Tolerances and limits of the adaptive solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Relative tolerance of the local error
    pub rtol: f64,
    /// Absolute tolerance of the local error
    pub atol: f64,
    /// First trial step size (ms)
    pub initial_step: f64,
    /// Smallest step size before giving up (ms)
    pub min_step: f64,
    /// Largest step size allowed (ms)
    pub max_step: f64,
    /// Maximum number of attempted steps across the whole integration
    pub max_steps: usize,
    /// Optional wall clock limit for one integration
    pub timeout: Option<Duration>,
    /// Stepping scheme
    pub method: SolverMethod,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            rtol: 1e-6,
            atol: 1e-8,
            initial_step: 1e-3,
            min_step: 1e-12,
            max_step: f64::INFINITY,
            max_steps: 10_000_000,
            timeout: None,
            method: SolverMethod::Auto,
        }
    }
}

impl SolverSettings {
    /// Checks that tolerances and step bounds are usable
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if !(self.rtol >= 0. && self.atol >= 0.) || (self.rtol == 0. && self.atol == 0.) {
            return Err(InvalidInputError::InvalidTolerance { reason: "tolerances must be non-negative and not both zero" });
        }
        if !(self.min_step > 0. && self.initial_step > 0. && self.max_step > 0.) {
            return Err(InvalidInputError::InvalidTolerance { reason: "step sizes must be positive" });
        }
        if self.min_step > self.max_step {
            return Err(InvalidInputError::InvalidTolerance { reason: "minimum step exceeds maximum step" });
        }
        if self.max_steps == 0 {
            return Err(InvalidInputError::InvalidTolerance { reason: "step budget must be positive" });
        }

        Ok(())
    }
}

// Dormand-Prince 5(4) tableau
const C2: f64 = 1. / 5.;
const C3: f64 = 3. / 10.;
const C4: f64 = 4. / 5.;
const C5: f64 = 8. / 9.;

const A21: f64 = 1. / 5.;
const A31: f64 = 3. / 40.;
const A32: f64 = 9. / 40.;
const A41: f64 = 44. / 45.;
const A42: f64 = -56. / 15.;
const A43: f64 = 32. / 9.;
const A51: f64 = 19372. / 6561.;
const A52: f64 = -25360. / 2187.;
const A53: f64 = 64448. / 6561.;
const A54: f64 = -212. / 729.;
const A61: f64 = 9017. / 3168.;
const A62: f64 = -355. / 33.;
const A63: f64 = 46732. / 5247.;
const A64: f64 = 49. / 176.;
const A65: f64 = -5103. / 18656.;
const A71: f64 = 35. / 384.;
const A73: f64 = 500. / 1113.;
const A74: f64 = 125. / 192.;
const A75: f64 = -2187. / 6784.;
const A76: f64 = 11. / 84.;

// difference between the fifth and fourth order weights
const E1: f64 = 71. / 57600.;
const E3: f64 = -71. / 16695.;
const E4: f64 = 71. / 1920.;
const E5: f64 = -17253. / 339200.;
const E6: f64 = 22. / 525.;
const E7: f64 = -1. / 40.;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.;
const DIVERGED_FACTOR: f64 = 0.25;

const DORMAND_PRINCE_ORDER: f64 = 5.;
const ROSENBROCK_ORDER: f64 = 3.;

fn all_finite<const N: usize>(values: &[f64; N]) -> bool {
    values.iter().all(|i| i.is_finite())
}

fn combine<const N: usize>(y: &[f64; N], h: f64, terms: &[(f64, &[f64; N])]) -> [f64; N] {
    let mut output = *y;
    for (coefficient, k) in terms {
        for (out, k_i) in output.iter_mut().zip(k.iter()) {
            *out += h * coefficient * k_i;
        }
    }

    output
}

/// Result of one trial step
struct TrialStep<const N: usize> {
    y: [f64; N],
    k_last: [f64; N],
    error: f64,
    /// Step size times the estimated dominant eigenvalue, only computed by explicit steps
    stiffness: Option<f64>,
}

fn error_norm<const N: usize>(
    error_estimate: &[f64; N],
    y: &[f64; N],
    y_new: &[f64; N],
    settings: &SolverSettings,
) -> f64 {
    let sum_of_squares: f64 = (0..N)
        .map(|i| {
            let scale = settings.atol + settings.rtol * y[i].abs().max(y_new[i].abs());
            (error_estimate[i] / scale).powi(2)
        })
        .sum();

    (sum_of_squares / N.max(1) as f64).sqrt()
}

fn dormand_prince_step<S: OdeSystem<N>, const N: usize>(
    system: &S,
    t: f64,
    y: &[f64; N],
    k1: &[f64; N],
    h: f64,
    settings: &SolverSettings,
) -> Option<TrialStep<N>> {
    let k2 = system.derivatives(t + C2 * h, &combine(y, h, &[(A21, k1)]));
    let k3 = system.derivatives(t + C3 * h, &combine(y, h, &[(A31, k1), (A32, &k2)]));
    let k4 = system.derivatives(t + C4 * h, &combine(y, h, &[(A41, k1), (A42, &k2), (A43, &k3)]));
    let k5 = system.derivatives(
        t + C5 * h,
        &combine(y, h, &[(A51, k1), (A52, &k2), (A53, &k3), (A54, &k4)]),
    );
    let y_stage6 = combine(y, h, &[(A61, k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)]);
    let k6 = system.derivatives(t + h, &y_stage6);
    let y_new = combine(y, h, &[(A71, k1), (A73, &k3), (A74, &k4), (A75, &k5), (A76, &k6)]);
    if !all_finite(&y_new) {
        return None;
    }
    let k7 = system.derivatives(t + h, &y_new);
    if !all_finite(&k7) {
        return None;
    }

    let error_estimate = combine(
        &[0.; N], h, &[(E1, k1), (E3, &k3), (E4, &k4), (E5, &k5), (E6, &k6), (E7, &k7)],
    );
    let error = error_norm(&error_estimate, y, &y_new, settings);
    if !error.is_finite() {
        return None;
    }

    // k6 and k7 are both evaluated at t + h, their difference over the difference of
    // their arguments approximates the largest eigenvalue of the Jacobian
    let derivative_change: f64 = (0..N).map(|i| (k7[i] - k6[i]).powi(2)).sum();
    let state_change: f64 = (0..N).map(|i| (y_new[i] - y_stage6[i]).powi(2)).sum();
    let stiffness = if state_change > 0. {
        Some(h * (derivative_change / state_change).sqrt())
    } else {
        None
    };

    Some(TrialStep { y: y_new, k_last: k7, error, stiffness })
}

/// LU factorization with partial pivoting of a small dense matrix
struct LuDecomposition<const N: usize> {
    lu: [[f64; N]; N],
    pivots: [usize; N],
}

impl<const N: usize> LuDecomposition<N> {
    /// Factorizes `matrix`, returns `None` if it is singular or not finite
    fn new(mut matrix: [[f64; N]; N]) -> Option<Self> {
        let mut pivots = [0; N];

        for column in 0..N {
            let pivot = (column..N)
                .max_by(|&a, &b| matrix[a][column].abs().total_cmp(&matrix[b][column].abs()))?;
            if matrix[pivot][column] == 0. || !matrix[pivot][column].is_finite() {
                return None;
            }
            matrix.swap(column, pivot);
            pivots[column] = pivot;

            for row in (column + 1)..N {
                let factor = matrix[row][column] / matrix[column][column];
                matrix[row][column] = factor;
                for i in (column + 1)..N {
                    matrix[row][i] -= factor * matrix[column][i];
                }
            }
        }

        Some(LuDecomposition { lu: matrix, pivots })
    }

    fn solve(&self, rhs: &[f64; N]) -> [f64; N] {
        let mut x = *rhs;
        for (column, &pivot) in self.pivots.iter().enumerate() {
            x.swap(column, pivot);
        }

        for row in 0..N {
            for i in 0..row {
                x[row] -= self.lu[row][i] * x[i];
            }
        }
        for row in (0..N).rev() {
            for i in (row + 1)..N {
                x[row] -= self.lu[row][i] * x[i];
            }
            x[row] /= self.lu[row][row];
        }

        x
    }
}

/// Forward difference Jacobian `df/dy` and time derivative `df/dt` at `(t, y)`
fn finite_difference_jacobian<S: OdeSystem<N>, const N: usize>(
    system: &S,
    t: f64,
    y: &[f64; N],
    f: &[f64; N],
) -> ([[f64; N]; N], [f64; N]) {
    let mut jacobian = [[0.; N]; N];
    for j in 0..N {
        let delta = f64::EPSILON.sqrt() * y[j].abs().max(1.);
        let mut shifted = *y;
        shifted[j] += delta;
        let f_shifted = system.derivatives(t, &shifted);

        for i in 0..N {
            jacobian[i][j] = (f_shifted[i] - f[i]) / delta;
        }
    }

    let delta_t = f64::EPSILON.sqrt() * t.abs().max(1.);
    let f_later = system.derivatives(t + delta_t, y);
    let mut time_derivative = [0.; N];
    for i in 0..N {
        time_derivative[i] = (f_later[i] - f[i]) / delta_t;
    }

    (jacobian, time_derivative)
}

// Rosenbrock 2(3) coefficients of the modified Rosenbrock triple
const ROSENBROCK_D: f64 = 1. / (2. + std::f64::consts::SQRT_2);
const ROSENBROCK_E32: f64 = 6. + std::f64::consts::SQRT_2;

/// One linearly implicit step, stable for stiff systems, `f0` is `f(t, y)`
fn rosenbrock_step<S: OdeSystem<N>, const N: usize>(
    system: &S,
    t: f64,
    y: &[f64; N],
    f0: &[f64; N],
    h: f64,
    settings: &SolverSettings,
) -> Option<TrialStep<N>> {
    let (jacobian, time_derivative) = finite_difference_jacobian(system, t, y, f0);
    if !jacobian.iter().all(|row| all_finite(row)) || !all_finite(&time_derivative) {
        return None;
    }

    let mut w = [[0.; N]; N];
    for i in 0..N {
        for j in 0..N {
            let identity = if i == j { 1. } else { 0. };
            w[i][j] = identity - h * ROSENBROCK_D * jacobian[i][j];
        }
    }
    let w = LuDecomposition::new(w)?;

    let hdt: [f64; N] = std::array::from_fn(|i| h * ROSENBROCK_D * time_derivative[i]);

    let k1 = w.solve(&std::array::from_fn(|i| f0[i] + hdt[i]));
    let f1 = system.derivatives(t + 0.5 * h, &combine(y, h, &[(0.5, &k1)]));
    let correction = w.solve(&std::array::from_fn(|i| f1[i] - k1[i]));
    let k2: [f64; N] = std::array::from_fn(|i| correction[i] + k1[i]);

    let y_new = combine(y, h, &[(1., &k2)]);
    if !all_finite(&y_new) {
        return None;
    }
    let f2 = system.derivatives(t + h, &y_new);
    if !all_finite(&f2) {
        return None;
    }

    let k3 = w.solve(&std::array::from_fn(|i| {
        f2[i] - ROSENBROCK_E32 * (k2[i] - f1[i]) - 2. * (k1[i] - f0[i]) + hdt[i]
    }));
    let error_estimate: [f64; N] = std::array::from_fn(|i| h / 6. * (k1[i] - 2. * k2[i] + k3[i]));
    let error = error_norm(&error_estimate, y, &y_new, settings);
    if !error.is_finite() {
        return None;
    }

    Some(TrialStep { y: y_new, k_last: f2, error, stiffness: None })
}

// the real stability boundary of the Dormand-Prince pair is about 3.3, accepted
// steps close to it are limited by stability rather than accuracy
const STIFFNESS_THRESHOLD: f64 = 3.;
const STIFF_STEPS: usize = 15;
const NON_STIFF_STEPS: usize = 6;

/// Counts consecutive accepted explicit steps limited by stability rather than accuracy
#[derive(Debug, Default)]
struct StiffnessDetector {
    stiff: usize,
    non_stiff: usize,
}

impl StiffnessDetector {
    /// Records one accepted step, returns whether the system should be treated as stiff
    fn record(&mut self, stiffness: Option<f64>) -> bool {
        match stiffness {
            Some(value) if value > STIFFNESS_THRESHOLD => {
                self.non_stiff = 0;
                self.stiff += 1;
            },
            Some(_) => {
                self.non_stiff += 1;
                if self.non_stiff == NON_STIFF_STEPS {
                    self.stiff = 0;
                }
            },
            None => {},
        }

        self.stiff >= STIFF_STEPS
    }
}

/// Integrates `system` from `y0` at the first grid time and returns one row per grid
/// time, the first row is `y0` itself
pub fn integrate<S: OdeSystem<N>, const N: usize>(
    system: &S,
    y0: [f64; N],
    grid: &TimeGrid,
    settings: &SolverSettings,
) -> Result<Array2<f64>, IntegrationError> {
    let times = grid.as_slice();
    let mut output = Array2::<f64>::zeros((times.len(), N));
    output.row_mut(0).assign(&ArrayView1::from(&y0[..]));

    let started = Instant::now();
    let mut t = times[0];
    let mut y = y0;
    let mut k1 = system.derivatives(t, &y);
    if !all_finite(&y) || !all_finite(&k1) {
        return Err(IntegrationError::Diverged { time: t });
    }

    let mut h = settings.initial_step.min(settings.max_step);
    let mut attempted: usize = 0;
    let mut rejected: usize = 0;
    let mut implicit = settings.method == SolverMethod::Rosenbrock;
    let mut detector = StiffnessDetector::default();

    for (index, &target) in times.iter().enumerate().skip(1) {
        while t < target {
            if let Some(limit) = settings.timeout {
                let elapsed = started.elapsed();
                if elapsed > limit {
                    return Err(IntegrationError::Timeout { time: t, elapsed });
                }
            }
            if attempted >= settings.max_steps {
                return Err(IntegrationError::TooManySteps { time: t });
            }
            attempted += 1;

            let remaining = target - t;
            let lands_on_target = h >= remaining;
            let step = if lands_on_target { remaining } else { h };
            if !lands_on_target && (step < settings.min_step || t + step <= t) {
                return Err(IntegrationError::StepSizeUnderflow { time: t });
            }

            let (trial, order) = if implicit {
                (rosenbrock_step(system, t, &y, &k1, step, settings), ROSENBROCK_ORDER)
            } else {
                (dormand_prince_step(system, t, &y, &k1, step, settings), DORMAND_PRINCE_ORDER)
            };
            let exponent = -1. / order;

            match trial {
                Some(trial) if trial.error <= 1. => {
                    t = if lands_on_target { target } else { t + step };
                    y = trial.y;
                    k1 = trial.k_last;

                    let factor = if trial.error == 0. {
                        MAX_FACTOR
                    } else {
                        (SAFETY * trial.error.powf(exponent)).clamp(MIN_FACTOR, MAX_FACTOR)
                    };
                    // a step shortened to hit the grid says nothing about the natural step size
                    let proposed = step * factor;
                    h = if lands_on_target { h.max(proposed) } else { proposed };
                    h = h.min(settings.max_step);

                    if !implicit && detector.record(trial.stiffness) {
                        match settings.method {
                            SolverMethod::Auto => {
                                debug!(time = t, step = h, "stiffness detected, switching to Rosenbrock steps");
                                implicit = true;
                            },
                            _ => return Err(IntegrationError::Stiff { time: t }),
                        }
                    }
                }
                Some(trial) => {
                    rejected += 1;
                    h = step * (SAFETY * trial.error.powf(exponent)).clamp(MIN_FACTOR, 1.);
                    if h < settings.min_step {
                        return Err(IntegrationError::StepSizeUnderflow { time: t });
                    }
                }
                None => {
                    rejected += 1;
                    h = step * DIVERGED_FACTOR;
                    if h < settings.min_step {
                        return Err(IntegrationError::Diverged { time: t });
                    }
                }
            }
        }

        output.row_mut(index).assign(&ArrayView1::from(&y[..]));
    }

    debug!(
        attempted_steps = attempted,
        rejected_steps = rejected,
        implicit,
        samples = times.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "integration finished"
    );

    Ok(output)
}

/// Number of components in `[V, m, h, n]`
pub const STATE_COMPONENTS: usize = 4;

/// Time grid and the state of the membrane at every grid time
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    times: Array1<f64>,
    states: Array2<f64>,
}

impl Trajectory {
    /// Pairs a time grid with integrated states, `states` must have one row per
    /// time and one column per state component
    pub fn new(grid: &TimeGrid, states: Array2<f64>) -> Result<Self, InvalidInputError> {
        if states.nrows() != grid.len() || states.ncols() != STATE_COMPONENTS {
            return Err(InvalidInputError::TrajectoryShape {
                rows: states.nrows(),
                columns: states.ncols(),
                samples: grid.len(),
            });
        }

        Ok(Trajectory {
            times: Array1::from_vec(grid.as_slice().to_vec()),
            states,
        })
    }

    pub fn len(&self) -> usize {
        self.states.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.states.nrows() == 0
    }

    /// Sample times (ms)
    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    /// States with columns `[V, m, h, n]`
    pub fn states(&self) -> ArrayView2<'_, f64> {
        self.states.view()
    }

    /// Membrane potential over time (mV)
    pub fn voltages(&self) -> ArrayView1<'_, f64> {
        self.states.column(0)
    }

    /// State at the given sample index
    pub fn state_at(&self, index: usize) -> Option<HodgkinHuxleyState> {
        if index >= self.len() {
            return None;
        }
        let row = self.states.row(index);

        Some(HodgkinHuxleyState { v: row[0], m: row[1], h: row[2], n: row[3] })
    }

    /// Final state of the trajectory
    pub fn last_state(&self) -> Option<HodgkinHuxleyState> {
        self.len().checked_sub(1).and_then(|i| self.state_at(i))
    }
}

/// Validates inputs and integrates the Hodgkin Huxley system over the grid
pub fn simulate(
    params: &HodgkinHuxleyParameters,
    initial_state: &HodgkinHuxleyState,
    grid: &TimeGrid,
    settings: &SolverSettings,
) -> Result<Trajectory, SimulationError> {
    params.validate()?;
    settings.validate()?;
    initial_state.validate()?;

    let states = integrate(params, initial_state.to_array(), grid, settings)?;

    Ok(Trajectory::new(grid, states)?)
}
