use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hodgkin_huxley_synapse::{
    integrator::{simulate, SolverSettings, TimeGrid},
    neuron::hodgkin_huxley::{derivatives, HodgkinHuxleyParameters, HodgkinHuxleyState},
    scenario::{reference_scenarios, ScenarioRunner},
};


fn bench_derivatives(c: &mut Criterion) {
    let params = HodgkinHuxleyParameters::default();
    let state = HodgkinHuxleyState::default();

    c.bench_function("derivatives", |b| {
        b.iter(|| derivatives(black_box(&state), black_box(12.), black_box(&params)))
    });
}

fn bench_baseline_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("baseline_simulation");
    let params = HodgkinHuxleyParameters::default();
    let state = HodgkinHuxleyState::default();

    for samples in [100, 1000, 10000] {
        let grid = TimeGrid::linspace(0., 50., samples).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(samples), &grid, |b, grid| {
            b.iter(|| simulate(&params, &state, grid, &SolverSettings::default()).unwrap())
        });
    }

    group.finish();
}

fn bench_reference_scenarios(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_scenarios");
    let scenarios = reference_scenarios(&HodgkinHuxleyParameters::default());
    let grid = TimeGrid::linspace(0., 50., 10000).unwrap();

    for parallel in [false, true] {
        let mut runner = ScenarioRunner::new(HodgkinHuxleyState::default(), grid.clone());
        runner.parallel = parallel;

        let name = if parallel { "parallel" } else { "sequential" };
        group.bench_function(name, |b| {
            b.iter(|| runner.run(&scenarios).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_derivatives, bench_baseline_simulation, bench_reference_scenarios);
criterion_main!(benches);
