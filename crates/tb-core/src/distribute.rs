//! Spreads ticket totals across working days.
//!
//! Tickets are placed left to right into days of fixed capacity. A ticket
//! that does not fit in what is left of the current day fills the day and
//! carries its remainder into the next one. Tickets are never reordered.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use crate::balance::PaddingAllocation;
use crate::ticket::Ticket;
use crate::time::Minutes;

/// Part of one ticket's reported time placed on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySlice {
    pub name: String,
    pub day: String,
    pub total: Minutes,
}

/// Errors from distributing tickets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DistributeError {
    /// Tickets and paddings do not describe the same ticket names.
    #[error(
        "ticket names in tickets and paddings do not match (without padding: {missing:?}, unknown padding: {unknown:?})"
    )]
    TicketSetMismatch {
        missing: Vec<String>,
        unknown: Vec<String>,
    },
    /// A ticket would occupy zero or negative calendar space.
    #[error("ticket {name} has non-positive total time ({total} minutes)")]
    NonPositiveTotal { name: String, total: Minutes },
}

/// First-fit packer over working days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distributer {
    /// Minutes available per working day.
    pub day_capacity: Minutes,
}

impl Default for Distributer {
    fn default() -> Self {
        Self {
            day_capacity: 8 * 60,
        }
    }
}

impl Distributer {
    pub const fn new(day_capacity: Minutes) -> Self {
        Self { day_capacity }
    }

    /// Places each ticket's `real + fake` onto `days`, in order.
    ///
    /// Every day but the last one touched ends exactly full. When the days
    /// run out, whatever is left is dropped.
    pub fn distribute(
        &self,
        tickets: &[Ticket],
        paddings: &[PaddingAllocation],
        days: &[String],
    ) -> Result<Vec<DaySlice>, DistributeError> {
        let mut remaining = totals(tickets, paddings)?;

        let mut slices = Vec::new();
        let mut ticket_idx = 0;
        let mut day_idx = 0;
        let mut accumulated: Minutes = 0;

        while ticket_idx < remaining.len() && day_idx < days.len() {
            let (name, total) = &mut remaining[ticket_idx];
            let day = &days[day_idx];

            if accumulated + *total < self.day_capacity {
                if *total > 0 {
                    slices.push(DaySlice {
                        name: name.clone(),
                        day: day.clone(),
                        total: *total,
                    });
                }
                accumulated += *total;
                *total = 0;
                ticket_idx += 1;
            } else {
                let rest_of_day = self.day_capacity - accumulated;
                if rest_of_day > 0 {
                    slices.push(DaySlice {
                        name: name.clone(),
                        day: day.clone(),
                        total: rest_of_day,
                    });
                }
                *total -= rest_of_day;
                day_idx += 1;
                accumulated = 0;
            }
        }

        let dropped: Minutes = remaining[ticket_idx..].iter().map(|(_, total)| total).sum();
        if dropped > 0 {
            tracing::debug!(
                dropped,
                days = days.len(),
                "days exhausted before all tickets were placed"
            );
        }

        Ok(slices)
    }
}

/// Pairs every ticket with its padding and returns `(name, real + fake)`.
fn totals(
    tickets: &[Ticket],
    paddings: &[PaddingAllocation],
) -> Result<Vec<(String, Minutes)>, DistributeError> {
    let fakes: HashMap<&str, Minutes> =
        paddings.iter().map(|p| (p.name.as_str(), p.fake)).collect();
    let names: HashSet<&str> = tickets.iter().map(|t| t.name.as_str()).collect();

    let missing: Vec<String> = tickets
        .iter()
        .filter(|t| !fakes.contains_key(t.name.as_str()))
        .map(|t| t.name.clone())
        .collect();
    let unknown: Vec<String> = paddings
        .iter()
        .filter(|p| !names.contains(p.name.as_str()))
        .map(|p| p.name.clone())
        .collect();
    if !missing.is_empty() || !unknown.is_empty() {
        return Err(DistributeError::TicketSetMismatch { missing, unknown });
    }

    tickets
        .iter()
        .map(|ticket| {
            let total = ticket.real + fakes[ticket.name.as_str()];
            if total <= 0 {
                return Err(DistributeError::NonPositiveTotal {
                    name: ticket.name.clone(),
                    total,
                });
            }
            Ok((ticket.name.clone(), total))
        })
        .collect()
}
