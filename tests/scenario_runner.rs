#[cfg(test)]
mod tests {
    extern crate hodgkin_huxley_synapse;
    use hodgkin_huxley_synapse::{
        analysis::{peak_voltage, ActionPotentialSummary, DEFAULT_SPIKE_THRESHOLD},
        error::{IntegrationError, InvalidInputError, SimulationError},
        integrator::TimeGrid,
        neuron::{
            hodgkin_huxley::{HodgkinHuxleyParameters, HodgkinHuxleyState},
            synapse::Synapse,
        },
        scenario::{reference_scenarios, Scenario, ScenarioRunner},
    };


    fn runner() -> Result<ScenarioRunner, SimulationError> {
        Ok(ScenarioRunner::new(HodgkinHuxleyState::default(), TimeGrid::linspace(0., 50., 2000)?))
    }

    fn broken_scenario() -> Scenario {
        let mut parameters = HodgkinHuxleyParameters::default().with_synapse(Synapse::excitatory());
        parameters.g_k = -36.;

        Scenario::new("Broken", parameters)
    }

    fn diverging_scenario() -> Scenario {
        // the net current divided by the smallest positive capacitance overflows
        let mut parameters = HodgkinHuxleyParameters::default().with_synapse(Synapse::excitatory());
        parameters.c_m = f64::MIN_POSITIVE;

        Scenario::new("Diverging", parameters)
    }

    #[test]
    pub fn test_reference_scenarios_cover_every_grid_time() -> Result<(), SimulationError> {
        let runner = runner()?;
        let scenarios = reference_scenarios(&HodgkinHuxleyParameters::default());
        let results = runner.run(&scenarios)?;

        assert_eq!(
            results.labels(),
            vec![Scenario::NORMAL_LABEL, Scenario::INHIBITORY_LABEL, Scenario::TTX_LABEL]
        );
        assert!(results.failures().is_empty());

        for (_, trajectory) in results.successes() {
            assert_eq!(trajectory.len(), runner.time_grid.len());
            assert_eq!(trajectory.times()[0], 0.);
            assert_eq!(trajectory.times()[trajectory.len() - 1], 50.);
            assert_eq!(trajectory.state_at(0), Some(HodgkinHuxleyState::default()));
        }

        Ok(())
    }

    #[test]
    pub fn test_sodium_block_prevents_action_potentials() -> Result<(), SimulationError> {
        let results = runner()?.run(&reference_scenarios(&HodgkinHuxleyParameters::default()))?;

        let normal = results.trajectory(Scenario::NORMAL_LABEL).unwrap();
        let ttx = results.trajectory(Scenario::TTX_LABEL).unwrap();

        let normal_peak = peak_voltage(normal.voltages()).unwrap();
        let ttx_peak = peak_voltage(ttx.voltages()).unwrap();

        assert!(normal_peak > 0.);
        assert!(ttx_peak < 0.);
        assert!(ttx_peak < normal_peak - 50.);
        assert_eq!(ActionPotentialSummary::from_trajectory(ttx, DEFAULT_SPIKE_THRESHOLD).num_spikes, 0);

        Ok(())
    }

    #[test]
    pub fn test_synapse_only_changes_trajectory_after_onset() -> Result<(), SimulationError> {
        let base = HodgkinHuxleyParameters::default();
        let scenarios = vec![
            Scenario::normal(&base),
            Scenario::inhibitory(&base),
            Scenario::action_potential(&base),
        ];
        let results = runner()?.run(&scenarios)?;

        let normal = results.trajectory(Scenario::NORMAL_LABEL).unwrap();
        let inhibitory = results.trajectory(Scenario::INHIBITORY_LABEL).unwrap();
        let plain = results.trajectory(Scenario::ACTION_POTENTIAL_LABEL).unwrap();

        let before_onset = normal.times().iter().take_while(|&&t| t <= 10.).count();
        for i in 0..before_onset {
            assert_eq!(normal.state_at(i), plain.state_at(i));
            assert_eq!(inhibitory.state_at(i), plain.state_at(i));
        }
        assert_ne!(normal.voltages(), inhibitory.voltages());

        Ok(())
    }

    #[test]
    pub fn test_parallel_matches_sequential() -> Result<(), SimulationError> {
        let scenarios = reference_scenarios(&HodgkinHuxleyParameters::default());

        let parallel = runner()?.run(&scenarios)?;
        let mut sequential_runner = runner()?;
        sequential_runner.parallel = false;
        let sequential = sequential_runner.run(&scenarios)?;

        assert_eq!(parallel.labels(), sequential.labels());
        for label in parallel.labels() {
            assert_eq!(parallel.trajectory(label), sequential.trajectory(label));
        }

        Ok(())
    }

    #[test]
    pub fn test_failure_does_not_abort_other_scenarios() -> Result<(), SimulationError> {
        let mut scenarios = reference_scenarios(&HodgkinHuxleyParameters::default());
        scenarios.insert(1, broken_scenario());

        for parallel in [true, false] {
            let mut runner = runner()?;
            runner.parallel = parallel;
            let results = runner.run(&scenarios)?;

            assert_eq!(results.len(), 4);
            assert_eq!(results.successes().len(), 3);

            let failures = results.failures();
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, "Broken");
            assert!(matches!(
                failures[0].1.invalid_input_error(),
                Some(InvalidInputError::NegativeConductance { name: "g_k", .. })
            ));
            assert!(results.trajectory(Scenario::TTX_LABEL).is_some());
        }

        Ok(())
    }

    #[test]
    pub fn test_fail_fast_reports_scenario_label() -> Result<(), SimulationError> {
        let mut scenarios = reference_scenarios(&HodgkinHuxleyParameters::default());
        scenarios.push(broken_scenario());

        for parallel in [true, false] {
            let mut runner = runner()?;
            runner.parallel = parallel;
            runner.fail_fast = true;

            match runner.run(&scenarios) {
                Err(SimulationError::Scenario { label, source }) => {
                    assert_eq!(label, "Broken");
                    assert!(matches!(*source, SimulationError::InvalidInput(_)));
                },
                other => panic!("unexpected result: {:?}", other.map(|i| i.labels().len())),
            }
        }

        Ok(())
    }

    #[test]
    pub fn test_duplicate_labels_rejected() -> Result<(), SimulationError> {
        let base = HodgkinHuxleyParameters::default();
        let scenarios = vec![Scenario::normal(&base), Scenario::normal(&base)];

        let error = runner()?.run(&scenarios).unwrap_err();

        assert!(matches!(
            error.invalid_input_error(),
            Some(InvalidInputError::DuplicateScenarioLabel { label }) if label == Scenario::NORMAL_LABEL
        ));

        Ok(())
    }

    #[test]
    pub fn test_empty_scenario_list() -> Result<(), SimulationError> {
        let results = runner()?.run(&[])?;

        assert!(results.is_empty());
        assert!(results.labels().is_empty());

        Ok(())
    }

    #[test]
    pub fn test_divergence_reports_label_and_time() -> Result<(), SimulationError> {
        let mut scenarios = reference_scenarios(&HodgkinHuxleyParameters::default());
        scenarios.insert(0, diverging_scenario());

        let results = runner()?.run(&scenarios)?;
        assert_eq!(results.successes().len(), 3);

        let failures = results.failures();
        assert_eq!(failures.len(), 1);
        match failures[0].1 {
            SimulationError::Scenario { label, source } => {
                assert_eq!(label, "Diverging");
                assert!(matches!(**source, SimulationError::Integration(IntegrationError::Diverged { .. })));
            },
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            failures[0].1.integration_error(),
            Some(&IntegrationError::Diverged { time: 0. })
        );

        let mut fail_fast = runner()?;
        fail_fast.fail_fast = true;
        let error = fail_fast.run(&scenarios).unwrap_err();
        assert!(matches!(&error, SimulationError::Scenario { label, .. } if label == "Diverging"));
        assert!(matches!(error.integration_error(), Some(IntegrationError::Diverged { time }) if *time == 0.));

        Ok(())
    }
}
