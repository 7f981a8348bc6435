#[cfg(test)]
mod tests {
    extern crate hodgkin_huxley_synapse;
    use hodgkin_huxley_synapse::neuron::{
        gating::{alpha_h, alpha_m, alpha_n, beta_h, beta_m, beta_n},
        hodgkin_huxley::{derivatives, HodgkinHuxleyParameters, HodgkinHuxleyState},
        ion_channels::{leak_current, potassium_current, sodium_current, synaptic_current, MembraneCurrents},
        synapse::{Synapse, SynapticShape},
    };


    #[test]
    pub fn test_shape_is_zero_before_onset() {
        let shape = SynapticShape::default();

        for tau in [-1000., -10., -1e-9, 0.] {
            assert_eq!(shape.weight(tau), 0.);
        }
        assert_eq!(shape.weight(f64::NEG_INFINITY), 0.);
    }

    #[test]
    pub fn test_shape_matches_closed_form() {
        let shape = SynapticShape::default();

        for tau in [0.1, 0.5, 1., 2.5, 5., 10.] {
            let expected = (tau / 5.) * (-tau / 0.5_f64).exp();
            assert!((shape.weight(tau) - expected).abs() < 1e-15);
        }
    }

    #[test]
    pub fn test_shape_maximum_is_at_peak_time() {
        let shape = SynapticShape::default();
        let (best_tau, best_weight) = (0..=50000)
            .map(|i| i as f64 * 0.001)
            .map(|tau| (tau, shape.weight(tau)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap();

        assert!((best_tau - shape.peak_time()).abs() < 1e-3);
        assert!((best_weight - shape.peak_weight()).abs() < 1e-9);
        assert!((shape.peak_weight() - 0.1 * (-1_f64).exp()).abs() < 1e-12);
    }

    #[test]
    pub fn test_shape_decays_to_zero() {
        let shape = SynapticShape::default();
        let late: Vec<f64> = [5., 10., 20., 50., 100.].iter().map(|&tau| shape.weight(tau)).collect();

        assert!(late.windows(2).all(|pair| pair[1] <= pair[0]));
        assert!(shape.weight(50.) < 1e-40);
        assert!(shape.weight(1000.) < 1e-300);
        assert_eq!(shape.weight(f64::INFINITY), 0.);
        assert_eq!(Synapse::excitatory().conductance(f64::INFINITY), 0.);
    }

    #[test]
    pub fn test_synapse_presets() {
        let excitatory = Synapse::excitatory();
        let inhibitory = Synapse::inhibitory();

        assert_eq!(excitatory.g_syn, 0.5);
        assert_eq!(excitatory.e_syn, 0.);
        assert_eq!(inhibitory.e_syn, -70.);
        assert_eq!(excitatory.onset, 10.);
        assert_eq!(excitatory.conductance(10.), 0.);
        assert!((excitatory.conductance(10.5) - 0.5 * 0.1 * (-1_f64).exp()).abs() < 1e-12);

        // excitatory input depolarizes and inhibitory input hyperpolarizes at rest
        assert!(excitatory.current(-65., 10.5) < 0.);
        assert!(inhibitory.current(-65., 10.5) > 0.);
    }

    #[test]
    pub fn test_ionic_currents() {
        let state = HodgkinHuxleyState { v: -60., m: 0.2, h: 0.5, n: 0.4 };
        let params = HodgkinHuxleyParameters::default();

        assert!((sodium_current(&state, &params) - 120. * 0.008 * 0.5 * -110.).abs() < 1e-9);
        assert!((potassium_current(&state, &params) - 36. * 0.0256 * 17.).abs() < 1e-9);
        assert!((leak_current(&state, &params) - 0.3 * -5.6).abs() < 1e-9);
        assert_eq!(synaptic_current(&state, 12., &params), 0.);

        let with_synapse = params.with_synapse(Synapse::excitatory());
        let expected_syn = 0.5 * SynapticShape::default().weight(2.) * -60.;
        assert!((synaptic_current(&state, 12., &with_synapse) - expected_syn).abs() < 1e-12);

        let currents = MembraneCurrents::compute(&state, 12., &with_synapse);
        assert!(
            (currents.total() - (currents.sodium + currents.potassium + currents.leak + currents.synaptic)).abs()
            < 1e-12
        );
    }

    #[test]
    pub fn test_derivatives_match_equations() {
        let state = HodgkinHuxleyState { v: -50., m: 0.1, h: 0.55, n: 0.35 };
        let params = HodgkinHuxleyParameters::default().with_synapse(Synapse::inhibitory());
        let t = 11.;

        let d = derivatives(&state, t, &params);

        let i_na = 120. * state.m.powi(3) * state.h * (state.v - 50.);
        let i_k = 36. * state.n.powi(4) * (state.v + 77.);
        let i_l = 0.3 * (state.v + 54.4);
        let i_syn = 0.5 * ((1. / 5.) * (-1. / 0.5_f64).exp()) * (state.v + 70.);
        let dv = (10. - (i_na + i_k + i_l + i_syn)) / 1.;

        assert!((d[0] - dv).abs() < 1e-9);
        assert!((d[1] - (alpha_m(state.v) * (1. - state.m) - beta_m(state.v) * state.m)).abs() < 1e-12);
        assert!((d[2] - (alpha_h(state.v) * (1. - state.h) - beta_h(state.v) * state.h)).abs() < 1e-12);
        assert!((d[3] - (alpha_n(state.v) * (1. - state.n) - beta_n(state.v) * state.n)).abs() < 1e-12);
    }

    #[test]
    pub fn test_synapse_has_no_effect_before_onset() {
        let state = HodgkinHuxleyState::default();
        let plain = HodgkinHuxleyParameters::default();
        let synaptic = plain.with_synapse(Synapse::excitatory());

        for t in [0., 5., 9.999, 10.] {
            assert_eq!(derivatives(&state, t, &plain), derivatives(&state, t, &synaptic));
        }
        assert_ne!(derivatives(&state, 10.5, &plain), derivatives(&state, 10.5, &synaptic));
    }

    #[test]
    pub fn test_sodium_block_removes_sodium_current() {
        let state = HodgkinHuxleyState { v: -20., m: 0.6, h: 0.4, n: 0.5 };
        let blocked = HodgkinHuxleyParameters::default().with_sodium_blocked();

        assert_eq!(sodium_current(&state, &blocked), 0.);
        assert_eq!(blocked.g_k, HodgkinHuxleyParameters::default().g_k);
    }

    #[test]
    pub fn test_derivatives_are_finite_at_singular_voltages() {
        let params = HodgkinHuxleyParameters::default();

        for v in [-40., -55.] {
            let state = HodgkinHuxleyState { v, ..HodgkinHuxleyState::default() };
            assert!(derivatives(&state, 0., &params).iter().all(|i| i.is_finite()));
        }
    }
}
