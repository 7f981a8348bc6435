//! A single time locked synapse whose conductance follows an alpha-like waveform
//! after a fixed onset delay.


/// Waveform weighting the synaptic conductance over time since onset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynapticShape {
    /// Scaling time of the rising edge (ms)
    pub t_peak: f64,
    /// Exponential decay time constant (ms)
    pub decay: f64,
}

impl Default for SynapticShape {
    fn default() -> Self {
        SynapticShape {
            t_peak: 5.,
            decay: 0.5,
        }
    }
}

impl SynapticShape {
    /// Evaluates `(tau / t_peak) * exp(-tau / decay)`, which is zero for all `tau <= 0`
    /// and tends to zero as `tau` grows
    pub fn weight(&self, elapsed: f64) -> f64 {
        let tau = elapsed.max(0.);
        if tau.is_infinite() {
            return 0.;
        }

        (tau / self.t_peak) * (-tau / self.decay).exp()
    }

    /// Elapsed time at which the waveform is largest (ms)
    pub fn peak_time(&self) -> f64 {
        self.decay
    }

    /// Largest value the waveform reaches
    pub fn peak_weight(&self) -> f64 {
        self.weight(self.peak_time())
    }
}

/// Synaptic conductance with its reversal potential and onset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Synapse {
    /// Maximal synaptic conductance (mS/cm²)
    pub g_syn: f64,
    /// Synaptic reversal potential (mV)
    pub e_syn: f64,
    /// Time at which the synaptic input begins (ms)
    pub onset: f64,
    /// Waveform of the conductance after onset
    pub shape: SynapticShape,
}

impl Default for Synapse {
    fn default() -> Self {
        Synapse::excitatory()
    }
}

impl Synapse {
    /// Default onset delay (ms)
    pub const DEFAULT_ONSET: f64 = 10.;

    /// Excitatory synapse reversing at 0 mV
    pub fn excitatory() -> Self {
        Synapse {
            g_syn: 0.5,
            e_syn: 0.,
            onset: Self::DEFAULT_ONSET,
            shape: SynapticShape::default(),
        }
    }

    /// Inhibitory synapse reversing at -70 mV
    pub fn inhibitory() -> Self {
        Synapse {
            g_syn: 0.5,
            e_syn: -70.,
            onset: Self::DEFAULT_ONSET,
            shape: SynapticShape::default(),
        }
    }

    /// Effective conductance at time `t` (mS/cm²)
    pub fn conductance(&self, t: f64) -> f64 {
        self.g_syn * self.shape.weight(t - self.onset)
    }

    /// Synaptic current at voltage `voltage` and time `t`
    pub fn current(&self, voltage: f64, t: f64) -> f64 {
        self.conductance(t) * (voltage - self.e_syn)
    }
}
