//! CSV readers for time logs and estimation guesses.
//!
//! Time log columns: `ticket,estimate,day,start,end`. Estimates are duration
//! cells (`1:30`, `1h30m`, `90`), start/end are `HH:MM` clock cells, and an
//! empty end falls back to the next row's start.
//!
//! Guess columns: `subtask,best,likely,worst`, all duration cells.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tb_core::pert::Guess;
use tb_core::time::{parse_clock, parse_duration};
use tb_core::LogRow;

#[derive(Debug, Deserialize)]
struct RawLogRow {
    #[serde(default)]
    ticket: String,
    #[serde(default)]
    estimate: String,
    #[serde(default)]
    day: String,
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
}

impl RawLogRow {
    fn is_blank(&self) -> bool {
        [&self.ticket, &self.estimate, &self.day, &self.start, &self.end]
            .iter()
            .all(|cell| cell.is_empty())
    }

    fn parse(self, line: usize) -> Result<LogRow> {
        let estimate = parse_duration(&self.estimate)
            .with_context(|| format!("line {line}: invalid estimate"))?;
        let start =
            parse_clock(&self.start).with_context(|| format!("line {line}: invalid start"))?;
        let end = if self.end.is_empty() {
            None
        } else {
            Some(parse_clock(&self.end).with_context(|| format!("line {line}: invalid end"))?)
        };

        Ok(LogRow {
            ticket: self.ticket,
            estimate,
            start,
            end,
            day: self.day,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawGuess {
    subtask: String,
    best: String,
    likely: String,
    worst: String,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

/// Reads a time log, skipping fully blank rows.
pub fn read_log<R: Read>(reader: R) -> Result<Vec<LogRow>> {
    let mut rows = Vec::new();
    for (idx, record) in csv_reader(reader).deserialize::<RawLogRow>().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        let raw = record.with_context(|| format!("line {line}: malformed row"))?;
        if raw.is_blank() {
            continue;
        }
        rows.push(raw.parse(line)?);
    }
    tracing::debug!(rows = rows.len(), "read time log");
    Ok(rows)
}

pub fn read_log_file(path: &Path) -> Result<Vec<LogRow>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_log(file).with_context(|| format!("failed to read time log {}", path.display()))
}

/// Reads subtask guesses.
pub fn read_guesses<R: Read>(reader: R) -> Result<Vec<Guess>> {
    csv_reader(reader)
        .deserialize::<RawGuess>()
        .enumerate()
        .map(|(idx, record)| {
            let line = idx + 2;
            let raw = record.with_context(|| format!("line {line}: malformed row"))?;
            let cell = |value: &str, field: &str| {
                parse_duration(value).with_context(|| format!("line {line}: invalid {field}"))
            };
            Ok(Guess {
                best: cell(&raw.best, "best")?,
                likely: cell(&raw.likely, "likely")?,
                worst: cell(&raw.worst, "worst")?,
                subtask: raw.subtask,
            })
        })
        .collect()
}

pub fn read_guesses_file(path: &Path) -> Result<Vec<Guess>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_guesses(file).with_context(|| format!("failed to read guesses {}", path.display()))
}
