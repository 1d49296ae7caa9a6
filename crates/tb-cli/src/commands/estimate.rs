//! Estimate command: three-point estimate from subtask guesses.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tb_core::pert::{self, PertEstimate};
use tb_core::time::format_duration;

use crate::config::Config;
use crate::input;

#[allow(clippy::cast_possible_truncation)]
fn minutes(value: f64) -> String {
    format_duration(value.round() as i64)
}

/// Formats the human-readable estimate.
pub fn format_estimate(estimate: &PertEstimate) -> String {
    let mut output = String::new();

    writeln!(output, "TIME ESTIMATION").unwrap();
    writeln!(output, "> Subtasks:").unwrap();
    for subtask in &estimate.subtasks {
        writeln!(
            output,
            "* {}: {} (sd {})",
            subtask.subtask,
            minutes(subtask.ee),
            minutes(subtask.sd)
        )
        .unwrap();
    }
    writeln!(output, "> EE: {} (sd {})", minutes(estimate.ee), minutes(estimate.sd)).unwrap();
    writeln!(output, "> E: {}", minutes(estimate.e)).unwrap();
    writeln!(output, "> Risk: {}%", estimate.risk_percent).unwrap();

    output
}

/// Runs the estimate command.
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    guesses: &Path,
    risk: Option<f64>,
    json: bool,
) -> Result<()> {
    let guesses_list = input::read_guesses_file(guesses)?;
    let estimate = pert::estimate(&guesses_list, risk.unwrap_or(config.risk))
        .with_context(|| format!("failed to estimate {}", guesses.display()))?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&estimate)?)?;
    } else {
        write!(writer, "{}", format_estimate(&estimate))?;
    }

    Ok(())
}
