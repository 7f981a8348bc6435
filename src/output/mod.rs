//! CSV export of trajectories for external plotting

use std::io::Write;
use csv::Writer;
use crate::integrator::Trajectory;
use crate::scenario::ScenarioResults;


/// Writes `time,V,m,h,n` rows for a single trajectory
pub fn write_trajectory<W: Write>(writer: W, trajectory: &Trajectory) -> Result<(), csv::Error> {
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(["time", "V", "m", "h", "n"])?;

    for (t, state) in trajectory.times().iter().zip(trajectory.states().rows()) {
        let mut record = vec![t.to_string()];
        record.extend(state.iter().map(|i| i.to_string()));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;

    Ok(())
}

/// Writes a `time` column followed by the voltage of every successful scenario,
/// scenarios share a time grid so rows line up, failed scenarios are skipped
pub fn write_voltages<W: Write>(writer: W, results: &ScenarioResults) -> Result<(), csv::Error> {
    let successes = results.successes();
    let mut csv_writer = Writer::from_writer(writer);

    let mut header = vec!["time"];
    header.extend(successes.iter().map(|(label, _)| *label));
    csv_writer.write_record(&header)?;

    if let Some((_, first)) = successes.first() {
        for (index, t) in first.times().iter().enumerate() {
            let mut record = vec![t.to_string()];
            record.extend(
                successes.iter().map(|(_, trajectory)| trajectory.voltages()[index].to_string())
            );
            csv_writer.write_record(&record)?;
        }
    }

    csv_writer.flush()?;

    Ok(())
}
