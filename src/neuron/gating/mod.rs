//! Voltage dependent opening and closing rates for the sodium activation (`m`),
//! sodium inactivation (`h`), and potassium activation (`n`) gates.
//!
//! All rates are in 1/ms and take the membrane potential in mV. The opening rates
//! of `m` and `n` have removable singularities at -40 mV and -55 mV, those are
//! resolved here so callers never see `NaN`.


/// Below this magnitude `x / (1 - exp(-x))` is evaluated with its Taylor expansion
const SINGULARITY_EPSILON: f64 = 1e-6;

/// Stable evaluation of `x / (1 - exp(-x))`, equal to `1` at `x = 0`
fn exp_ratio(x: f64) -> f64 {
    if x.abs() < SINGULARITY_EPSILON {
        1. + x / 2. + x * x / 12.
    } else {
        x / -(-x).exp_m1()
    }
}

/// Opening rate of the sodium activation gate
pub fn alpha_m(voltage: f64) -> f64 {
    // 0.1 * (V + 40) / (1 - exp(-(V + 40) / 10))
    exp_ratio((voltage + 40.) / 10.)
}

/// Closing rate of the sodium activation gate
pub fn beta_m(voltage: f64) -> f64 {
    4. * (-(voltage + 65.) / 18.).exp()
}

/// Opening rate of the sodium inactivation gate
pub fn alpha_h(voltage: f64) -> f64 {
    0.07 * (-(voltage + 65.) / 20.).exp()
}

/// Closing rate of the sodium inactivation gate
pub fn beta_h(voltage: f64) -> f64 {
    1. / (1. + (-(voltage + 35.) / 10.).exp())
}

/// Opening rate of the potassium activation gate
pub fn alpha_n(voltage: f64) -> f64 {
    // 0.01 * (V + 55) / (1 - exp(-(V + 55) / 10))
    0.1 * exp_ratio((voltage + 55.) / 10.)
}

/// Closing rate of the potassium activation gate
pub fn beta_n(voltage: f64) -> f64 {
    0.125 * (-(voltage + 65.) / 80.).exp()
}

/// The three gating variables of the Hodgkin Huxley model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatingVariable {
    /// Sodium activation
    M,
    /// Sodium inactivation
    H,
    /// Potassium activation
    N,
}

impl GatingVariable {
    /// All gating variables in state vector order
    pub const ALL: [GatingVariable; 3] = [GatingVariable::M, GatingVariable::H, GatingVariable::N];

    /// Opening rate at the given voltage
    pub fn alpha(&self, voltage: f64) -> f64 {
        match self {
            GatingVariable::M => alpha_m(voltage),
            GatingVariable::H => alpha_h(voltage),
            GatingVariable::N => alpha_n(voltage),
        }
    }

    /// Closing rate at the given voltage
    pub fn beta(&self, voltage: f64) -> f64 {
        match self {
            GatingVariable::M => beta_m(voltage),
            GatingVariable::H => beta_h(voltage),
            GatingVariable::N => beta_n(voltage),
        }
    }

    /// Value the gate relaxes to when voltage is held fixed
    pub fn steady_state(&self, voltage: f64) -> f64 {
        let alpha = self.alpha(voltage);
        alpha / (alpha + self.beta(voltage))
    }

    /// Relaxation time constant at a fixed voltage (ms)
    pub fn time_constant(&self, voltage: f64) -> f64 {
        1. / (self.alpha(voltage) + self.beta(voltage))
    }

    /// Rate of change of the gate given its current value
    pub fn derivative(&self, voltage: f64, state: f64) -> f64 {
        self.alpha(voltage) * (1. - state) - self.beta(voltage) * state
    }

    pub fn to_str(&self) -> &str {
        match self {
            GatingVariable::M => "m",
            GatingVariable::H => "h",
            GatingVariable::N => "n",
        }
    }
}

/// Returns the steady state `(m, h, n)` at the given voltage
pub fn steady_state_gates(voltage: f64) -> (f64, f64, f64) {
    (
        GatingVariable::M.steady_state(voltage),
        GatingVariable::H.steady_state(voltage),
        GatingVariable::N.steady_state(voltage),
    )
}
