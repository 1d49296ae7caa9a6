//! Track command: balance a logged week and spread it across working days.
//!
//! This module implements `tb track` with human-readable and JSON output.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tb_core::time::format_duration;
use tb_core::{DaySlice, Minutes, SummaryRow, TOTAL_LABEL, WeekReport, WorkingDays};

use crate::config::{Config, Strategy};
use crate::input;

const NAME_WIDTH: usize = 20;
const DAY_WIDTH: usize = 6;
const TIME_WIDTH: usize = 10;

// ========== Human Output ==========

fn write_summary_row(output: &mut String, row: &SummaryRow) {
    writeln!(
        output,
        "{:<NAME_WIDTH$}{:>TIME_WIDTH$}{:>TIME_WIDTH$}{:>TIME_WIDTH$}",
        row.name,
        format_duration(row.real),
        format_duration(row.fake),
        format_duration(row.total)
    )
    .unwrap();
}

/// Formats the human-readable report output.
pub fn format_report(report: &WeekReport) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "TIME REPORT: {} (target {})",
        report.days.as_slice().join(", "),
        format_duration(report.weekly_target)
    )
    .unwrap();

    // SUMMARY section
    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(
        output,
        "{:<NAME_WIDTH$}{:>TIME_WIDTH$}{:>TIME_WIDTH$}{:>TIME_WIDTH$}",
        "ticket", "real", "fake", "total"
    )
    .unwrap();
    for row in report.summary() {
        write_summary_row(&mut output, &row);
    }
    write_summary_row(&mut output, &report.summary_total());

    // DISTRIBUTION section
    writeln!(output).unwrap();
    writeln!(output, "DISTRIBUTION").unwrap();
    writeln!(output, "────────────").unwrap();
    writeln!(
        output,
        "{:<NAME_WIDTH$}{:<DAY_WIDTH$}{:>TIME_WIDTH$}",
        "ticket", "day", "total"
    )
    .unwrap();
    for slice in &report.slices {
        writeln!(
            output,
            "{:<NAME_WIDTH$}{:<DAY_WIDTH$}{:>TIME_WIDTH$}",
            slice.name,
            slice.day,
            format_duration(slice.total)
        )
        .unwrap();
    }
    writeln!(
        output,
        "{:<NAME_WIDTH$}{:<DAY_WIDTH$}{:>TIME_WIDTH$}",
        TOTAL_LABEL,
        "",
        format_duration(report.distributed_total())
    )
    .unwrap();

    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub days: &'a WorkingDays,
    pub weekly_target: Minutes,
    pub summary: Vec<SummaryRow>,
    pub total: SummaryRow,
    pub distribution: &'a [DaySlice],
    pub distributed_total: Minutes,
}

/// Formats report data as JSON.
pub fn format_report_json(report: &WeekReport) -> Result<String> {
    let json = JsonReport {
        days: &report.days,
        weekly_target: report.weekly_target,
        summary: report.summary(),
        total: report.summary_total(),
        distribution: &report.slices,
        distributed_total: report.distributed_total(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

// ========== Public Interface ==========

/// Runs the track command.
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    log: &Path,
    strategy: Option<Strategy>,
    json: bool,
) -> Result<()> {
    let rows = input::read_log_file(log)?;
    let report = config
        .engine(strategy)
        .run(&rows)
        .with_context(|| format!("failed to balance {}", log.display()))?;

    if json {
        writeln!(writer, "{}", format_report_json(&report)?)?;
    } else {
        write!(writer, "{}", format_report(&report))?;
    }

    Ok(())
}
