//! Ticket aggregation from a raw time log.
//!
//! A log is an ordered list of rows, each naming a ticket (or continuing the
//! previous one) with a start and an optional end time. Rows are folded left
//! to right into per-ticket totals; the only memory carried between rows is
//! the name of the ticket currently being worked.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::time::Minutes;

/// Ticket cell marker meaning "same ticket as the previous row".
pub const PREVIOUS_TICKET_MARKER: &str = "prev";

/// A worked ticket: accumulated real time and the latest estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    /// Lowercase ticket identifier, unique within a run.
    pub name: String,
    /// Worked minutes.
    pub real: Minutes,
    /// Latest non-zero estimate seen for the ticket, in minutes.
    pub estimated: Minutes,
}

impl Ticket {
    pub fn new(name: impl Into<String>, real: Minutes, estimated: Minutes) -> Self {
        Self {
            name: name.into(),
            real,
            estimated,
        }
    }
}

/// One row of the raw time log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    /// Ticket name, `"prev"` or empty.
    pub ticket: String,
    /// Estimate in minutes; zero means "no estimate on this row".
    pub estimate: Minutes,
    /// Start time in minutes after midnight.
    pub start: Minutes,
    /// End time in minutes after midnight. When absent, the next row's start
    /// is used.
    pub end: Option<Minutes>,
    /// Day label (e.g. "mon").
    pub day: String,
}

/// Errors from aggregating a log.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// A "previous" row appeared before any named ticket.
    #[error("no previous ticket available for row {row}")]
    NoPreviousTicket { row: usize },
    /// The last row of a ticket has no end time to fall back on.
    #[error("no end time available for ticket: {ticket}")]
    MissingEnd { ticket: String },
    /// A row ends before it starts.
    #[error("start time is greater than end time for ticket: {ticket} ({start} > {end})")]
    StartAfterEnd {
        ticket: String,
        start: Minutes,
        end: Minutes,
    },
    /// A duration field is negative.
    #[error("negative {field} for ticket: {ticket}")]
    NegativeDuration { ticket: String, field: &'static str },
}

/// Fold state: the ticket being worked plus the tickets seen so far.
#[derive(Debug, Default)]
struct Aggregation {
    current: Option<String>,
    tickets: Vec<Ticket>,
    index: HashMap<String, usize>,
}

impl Aggregation {
    /// Resolves the ticket a row belongs to, moving `current` when the row
    /// names a new ticket.
    fn advance(mut self, row_idx: usize, cell: &str) -> Result<(Self, String), AggregateError> {
        let cell = cell.trim();
        if cell.is_empty() || cell.eq_ignore_ascii_case(PREVIOUS_TICKET_MARKER) {
            let name = self
                .current
                .clone()
                .ok_or(AggregateError::NoPreviousTicket { row: row_idx })?;
            return Ok((self, name));
        }

        let name = cell.to_lowercase();
        self.current = Some(name.clone());
        Ok((self, name))
    }

    fn record(mut self, name: &str, estimate: Minutes, worked: Minutes) -> Self {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.tickets.push(Ticket::new(name, 0, 0));
                self.index.insert(name.to_string(), self.tickets.len() - 1);
                self.tickets.len() - 1
            }
        };

        let ticket = &mut self.tickets[idx];
        if estimate != 0 {
            ticket.estimated = estimate;
        }
        ticket.real += worked;
        self
    }
}

/// Aggregates log rows into tickets, in first-seen order.
///
/// Ticket names are lowercased. An empty ticket cell or `"prev"` (any case)
/// continues the previous ticket; a non-zero estimate on any row overwrites
/// the estimate of the ticket it belongs to.
pub fn aggregate(rows: &[LogRow]) -> Result<Vec<Ticket>, AggregateError> {
    let state = rows.iter().enumerate().try_fold(
        Aggregation::default(),
        |state, (row_idx, row)| {
            let (state, name) = state.advance(row_idx, &row.ticket)?;

            if row.estimate < 0 {
                return Err(AggregateError::NegativeDuration {
                    ticket: name,
                    field: "estimate",
                });
            }
            if row.start < 0 {
                return Err(AggregateError::NegativeDuration {
                    ticket: name,
                    field: "start time",
                });
            }

            let end = row
                .end
                .or_else(|| rows.get(row_idx + 1).map(|next| next.start))
                .ok_or_else(|| AggregateError::MissingEnd {
                    ticket: name.clone(),
                })?;
            if row.start > end {
                return Err(AggregateError::StartAfterEnd {
                    ticket: name,
                    start: row.start,
                    end,
                });
            }

            Ok(state.record(&name, row.estimate, end - row.start))
        },
    )?;

    tracing::debug!(tickets = state.tickets.len(), rows = rows.len(), "aggregated log");
    Ok(state.tickets)
}

/// Ordered, duplicate-free working day labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkingDays(Vec<String>);

impl WorkingDays {
    /// Collects day labels in first-seen order, ignoring case and blank cells.
    /// Labels are capitalised (`"mon"` -> `"Mon"`).
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut days: Vec<String> = Vec::new();
        for label in labels {
            let label = capitalize(label.trim());
            if label.is_empty() || days.iter().any(|d| d == &label) {
                continue;
            }
            days.push(label);
        }
        Self(days)
    }

    /// Working days appearing in a log.
    pub fn from_rows(rows: &[LogRow]) -> Self {
        Self::from_labels(rows.iter().map(|row| row.day.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Weekly target: one full day of capacity per working day.
    #[allow(clippy::cast_possible_wrap)]
    pub fn weekly_target(&self, day_capacity: Minutes) -> Minutes {
        self.0.len() as Minutes * day_capacity
    }
}

fn capitalize(label: &str) -> String {
    let lower = label.to_lowercase();
    let mut chars = lower.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
