use std::{fs::File, io::BufWriter, path::PathBuf};
use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use hodgkin_huxley_synapse::{
    analysis::{ActionPotentialSummary, DEFAULT_SPIKE_THRESHOLD},
    config::SimulationConfig,
    output::write_voltages,
};


/// Compares Hodgkin Huxley membrane responses across synaptic and pharmacological conditions
#[derive(Parser, Debug)]
#[command(name = "hodgkin_huxley_synapse", version)]
struct Cli {
    /// TOML file describing the time grid, membrane, and scenarios
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV file to write voltages to
    #[arg(short, long, default_value = "hodgkin_huxley_scenarios.csv")]
    output: PathBuf,

    /// Run scenarios one after another instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// Stop at the first failed scenario
    #[arg(long)]
    fail_fast: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
        )
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if cli.sequential {
        config.parallel = false;
    }
    if cli.fail_fast {
        config.fail_fast = true;
    }

    let runner = config.runner()?;
    let scenarios = config.scenarios()?;
    info!(
        scenarios = scenarios.len(),
        samples = runner.time_grid.len(),
        parallel = runner.parallel,
        "starting simulation"
    );

    let results = runner.run(&scenarios)?;

    for (label, result) in results.iter() {
        match result {
            Ok(trajectory) => {
                let summary = ActionPotentialSummary::from_trajectory(trajectory, DEFAULT_SPIKE_THRESHOLD);
                println!(
                    "{}: spikes: {}, peak voltage: {:.2} mV, first spike: {}, mean ISI: {}",
                    label,
                    summary.num_spikes,
                    summary.peak_voltage,
                    summary.first_spike_time.map_or("none".to_string(), |t| format!("{:.3} ms", t)),
                    summary.mean_interspike_interval.map_or("none".to_string(), |t| format!("{:.3} ms", t)),
                );
            },
            Err(e) => println!("{}: failed: {}", label, e),
        }
    }

    let file = File::create(&cli.output)
        .with_context(|| format!("Cannot create {}", cli.output.display()))?;
    write_voltages(BufWriter::new(file), &results)
        .with_context(|| format!("Cannot write {}", cli.output.display()))?;
    info!(path = %cli.output.display(), "wrote voltages");

    if !results.failures().is_empty() {
        anyhow::bail!("{} of {} scenarios failed", results.failures().len(), results.len());
    }

    Ok(())
}
