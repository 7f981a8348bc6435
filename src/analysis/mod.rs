//! Summaries of voltage traces such as peak voltage, threshold crossings, and spike timing

use ndarray::ArrayView1;
use crate::integrator::Trajectory;


/// Default voltage a trace must rise above to count as a spike (mV)
pub const DEFAULT_SPIKE_THRESHOLD: f64 = 0.;

/// Largest voltage in the trace, `None` for an empty trace
pub fn peak_voltage(voltages: ArrayView1<f64>) -> Option<f64> {
    voltages.iter()
        .copied()
        .max_by(|a, b| a.total_cmp(b))
}

/// Indices where the trace rises from at or below `threshold` to above it
pub fn threshold_crossings(voltages: ArrayView1<f64>, threshold: f64) -> Vec<usize> {
    (1..voltages.len())
        .filter(|&i| voltages[i - 1] <= threshold && voltages[i] > threshold)
        .collect()
}

/// Times of upward threshold crossings, interpolated linearly between samples (ms)
pub fn spike_times(trajectory: &Trajectory, threshold: f64) -> Vec<f64> {
    let times = trajectory.times();
    let voltages = trajectory.voltages();

    threshold_crossings(voltages, threshold)
        .into_iter()
        .map(|i| {
            let (t0, t1) = (times[i - 1], times[i]);
            let (v0, v1) = (voltages[i - 1], voltages[i]);

            t0 + (threshold - v0) / (v1 - v0) * (t1 - t0)
        })
        .collect()
}

/// Characteristics of the action potentials in one trajectory
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPotentialSummary {
    /// Number of upward threshold crossings
    pub num_spikes: usize,
    /// Largest voltage reached (mV)
    pub peak_voltage: f64,
    /// Time of the first spike if any (ms)
    pub first_spike_time: Option<f64>,
    /// Average time between consecutive spikes if there are at least two (ms)
    pub mean_interspike_interval: Option<f64>,
}

impl ActionPotentialSummary {
    /// Summarizes a trajectory using the given spike threshold
    pub fn from_trajectory(trajectory: &Trajectory, threshold: f64) -> Self {
        let spikes = spike_times(trajectory, threshold);

        let mean_interspike_interval = if spikes.len() >= 2 {
            let total: f64 = spikes.windows(2)
                .map(|pair| pair[1] - pair[0])
                .sum();

            Some(total / (spikes.len() - 1) as f64)
        } else {
            None
        };

        ActionPotentialSummary {
            num_spikes: spikes.len(),
            peak_voltage: peak_voltage(trajectory.voltages()).unwrap_or(f64::NAN),
            first_spike_time: spikes.first().copied(),
            mean_interspike_interval,
        }
    }
}
