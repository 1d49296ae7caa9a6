//! Weekly report pipeline: log rows in, balanced and distributed report out.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::balance::{BalanceError, Balancer, PaddingAllocation};
use crate::distribute::{DaySlice, DistributeError, Distributer};
use crate::rounding::Grid;
use crate::ticket::{AggregateError, LogRow, Ticket, WorkingDays, aggregate};
use crate::time::Minutes;

/// Label of the summary row appended to report tables.
pub const TOTAL_LABEL: &str = "TOTAL";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("time log has no rows")]
    EmptyLog,
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Balance(#[from] BalanceError),
    #[error(transparent)]
    Distribute(#[from] DistributeError),
}

/// One line of the per-ticket summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub name: String,
    pub real: Minutes,
    pub fake: Minutes,
    pub total: Minutes,
}

/// Everything computed for one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekReport {
    pub days: WorkingDays,
    pub weekly_target: Minutes,
    pub tickets: Vec<Ticket>,
    pub paddings: Vec<PaddingAllocation>,
    pub slices: Vec<DaySlice>,
}

impl WeekReport {
    /// Per-ticket rows in ticket order, without the total row.
    pub fn summary(&self) -> Vec<SummaryRow> {
        self.tickets
            .iter()
            .map(|ticket| {
                let fake = self
                    .paddings
                    .iter()
                    .find(|p| p.name == ticket.name)
                    .map_or(0, |p| p.fake);
                SummaryRow {
                    name: ticket.name.clone(),
                    real: ticket.real,
                    fake,
                    total: ticket.real + fake,
                }
            })
            .collect()
    }

    /// Column sums of the summary.
    pub fn summary_total(&self) -> SummaryRow {
        self.summary().into_iter().fold(
            SummaryRow {
                name: TOTAL_LABEL.to_string(),
                real: 0,
                fake: 0,
                total: 0,
            },
            |mut acc, row| {
                acc.real += row.real;
                acc.fake += row.fake;
                acc.total += row.total;
                acc
            },
        )
    }

    /// Sum of all distributed slices.
    pub fn distributed_total(&self) -> Minutes {
        self.slices.iter().map(|s| s.total).sum()
    }
}

/// Wires aggregation, balancing and distribution together.
pub struct Engine {
    balancer: Box<dyn Balancer>,
    distributer: Distributer,
    grid: Grid,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("distributer", &self.distributer)
            .field("grid", &self.grid)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(balancer: Box<dyn Balancer>, distributer: Distributer, grid: Grid) -> Self {
        Self {
            balancer,
            distributer,
            grid,
        }
    }

    /// Builds the weekly report for a log.
    #[allow(clippy::cast_precision_loss)]
    pub fn run(&self, rows: &[LogRow]) -> Result<WeekReport, EngineError> {
        if rows.is_empty() {
            return Err(EngineError::EmptyLog);
        }

        let days = WorkingDays::from_rows(rows);
        let tickets: Vec<Ticket> = aggregate(rows)?
            .into_iter()
            .map(|ticket| Ticket {
                real: self.grid.round_minutes(ticket.real as f64),
                ..ticket
            })
            .collect();
        tracing::debug!(?tickets, "ticket times");

        let weekly_target = days.weekly_target(self.distributer.day_capacity);
        let paddings = self.balancer.balance(&tickets, weekly_target)?;
        tracing::debug!(?paddings, "padding times");

        let slices = self
            .distributer
            .distribute(&tickets, &paddings, days.as_slice())?;

        let report = WeekReport {
            days,
            weekly_target,
            tickets,
            paddings,
            slices,
        };
        tracing::info!(
            tickets = report.tickets.len(),
            days = report.days.len(),
            weekly_target,
            distributed = report.distributed_total(),
            "week balanced"
        );
        Ok(report)
    }
}
