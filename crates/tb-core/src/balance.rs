//! Padding allocation strategies.
//!
//! A [`Balancer`] decides how much "fake" time to add to (or remove from)
//! each ticket so that the reported week reaches its target. Two strategies
//! exist: the greedy [`HeuristicBalancer`] here, and the LP-based
//! [`OptimizingBalancer`](crate::OptimizingBalancer) which falls back to
//! another balancer when its program is infeasible.
//!
//! # Heuristic
//!
//! 1. Tickets are sorted by estimate, largest first: adding an hour to a
//!    four-hour ticket distorts less than adding it to a two-hour one.
//! 2. If the week is short, each ticket is first filled up to its estimate
//!    (never discounted by more than `max_discount` of its real time), then
//!    any remainder is shared out by weight.
//! 3. If the week is over, every ticket shrinks in proportion to its
//!    estimate share.
//! 4. Paddings are rounded to the grid. No ticket drops below zero, and a
//!    ticket with more than one grid step of real time keeps at least one.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::rounding::Grid;
use crate::ticket::Ticket;
use crate::time::Minutes;

/// Signed adjustment to one ticket's reported time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaddingAllocation {
    pub name: String,
    pub fake: Minutes,
}

impl PaddingAllocation {
    pub fn new(name: impl Into<String>, fake: Minutes) -> Self {
        Self {
            name: name.into(),
            fake,
        }
    }
}

/// Errors from a balancing strategy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BalanceError {
    /// Nothing to balance.
    #[error("no tickets to balance")]
    NoTickets,
    /// Ticket names must be unique within a run.
    #[error("duplicate ticket name: {0}")]
    DuplicateTicket(String),
    /// Proportional sharing needs at least one positive estimate.
    #[error("all ticket estimates are zero; cannot share {minutes} minutes proportionally")]
    ZeroEstimates { minutes: Minutes },
}

/// A padding allocation strategy.
pub trait Balancer: Send + Sync {
    /// Computes one padding per ticket for a week of `weekly_target` minutes.
    fn balance(
        &self,
        tickets: &[Ticket],
        weekly_target: Minutes,
    ) -> Result<Vec<PaddingAllocation>, BalanceError>;
}

/// Checks the shared preconditions: at least one ticket, unique names.
pub(crate) fn validate_tickets(tickets: &[Ticket]) -> Result<(), BalanceError> {
    if tickets.is_empty() {
        return Err(BalanceError::NoTickets);
    }
    let mut seen = HashSet::new();
    for ticket in tickets {
        if !seen.insert(ticket.name.as_str()) {
            return Err(BalanceError::DuplicateTicket(ticket.name.clone()));
        }
    }
    Ok(())
}

/// Greedy fill/shrink balancer. Deterministic; fails only on invalid input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicBalancer {
    /// How strongly an overrun reduces a ticket's share of leftover time.
    /// In `[0, 1]`.
    pub deviation_penalty: f64,
    /// Largest fraction of a ticket's real time that may be discounted.
    pub max_discount: f64,
    /// Grid every padding is rounded to.
    pub grid: Grid,
}

impl Default for HeuristicBalancer {
    fn default() -> Self {
        Self {
            deviation_penalty: 0.5,
            max_discount: 0.25,
            grid: Grid::default(),
        }
    }
}

/// Working state for one ticket during a heuristic pass.
#[derive(Debug)]
struct Share<'a> {
    ticket: &'a Ticket,
    fake: f64,
    weight: f64,
}

impl HeuristicBalancer {
    pub const fn new(deviation_penalty: f64, max_discount: f64, grid: Grid) -> Self {
        Self {
            deviation_penalty,
            max_discount,
            grid,
        }
    }

    /// Lowest padding a ticket may receive. A ticket with more than one grid
    /// step of real time keeps at least one step, so it stays reportable.
    fn min_padding(&self, real: Minutes) -> Minutes {
        let keep = self.grid.ceil_to_step(1);
        if real > keep { keep - real } else { -real }
    }

    /// Fills tickets up to their estimate, then spreads what is left by
    /// weight.
    #[allow(clippy::cast_precision_loss)]
    fn fill(&self, shares: &mut [Share<'_>], time_to_fill: Minutes) -> Result<(), BalanceError> {
        let mut remaining = time_to_fill as f64;

        for share in shares.iter_mut() {
            let real = share.ticket.real as f64;
            let deviation = (share.ticket.estimated - share.ticket.real) as f64;
            share.fake = deviation.max(-self.max_discount * real);
            share.weight = (share.weight + self.deviation_penalty * deviation.min(0.0)).max(0.0);
            remaining -= share.fake;
        }

        if remaining <= 0.0 {
            return Ok(());
        }

        let mut weight_sum: f64 = shares.iter().map(|s| s.weight).sum();
        if weight_sum <= 0.0 {
            // Every ticket was penalised to nothing; fall back to estimates.
            for share in shares.iter_mut() {
                share.weight = share.ticket.estimated as f64;
            }
            weight_sum = estimate_sum(shares, remaining)?;
        }

        for share in shares.iter_mut() {
            share.fake += (remaining * share.weight / weight_sum).ceil();
        }
        Ok(())
    }

    /// Shrinks every ticket in proportion to its estimate.
    ///
    /// `ceil` rounds each share toward zero, so the total can stay slightly
    /// above the target.
    #[allow(clippy::cast_precision_loss)]
    fn shrink(shares: &mut [Share<'_>], time_to_fill: Minutes) -> Result<(), BalanceError> {
        let excess = time_to_fill as f64;
        let estimated_sum = estimate_sum(shares, excess)?;
        for share in shares.iter_mut() {
            share.fake = (excess * share.ticket.estimated as f64 / estimated_sum).ceil();
        }
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn estimate_sum(shares: &[Share<'_>], minutes: f64) -> Result<f64, BalanceError> {
    let sum: Minutes = shares.iter().map(|s| s.ticket.estimated).sum();
    if sum <= 0 {
        return Err(BalanceError::ZeroEstimates {
            minutes: minutes.round() as Minutes,
        });
    }
    Ok(sum as f64)
}

impl Balancer for HeuristicBalancer {
    #[allow(clippy::cast_precision_loss)]
    fn balance(
        &self,
        tickets: &[Ticket],
        weekly_target: Minutes,
    ) -> Result<Vec<PaddingAllocation>, BalanceError> {
        validate_tickets(tickets)?;

        let mut sorted: Vec<&Ticket> = tickets.iter().collect();
        // Stable: equal estimates keep input order.
        sorted.sort_by(|a, b| b.estimated.cmp(&a.estimated));

        let mut shares: Vec<Share<'_>> = sorted
            .into_iter()
            .map(|ticket| Share {
                ticket,
                fake: 0.0,
                weight: ticket.estimated as f64,
            })
            .collect();

        let real_sum: Minutes = tickets.iter().map(|t| t.real).sum();
        let time_to_fill = weekly_target - real_sum;

        if time_to_fill > 0 {
            self.fill(&mut shares, time_to_fill)?;
        } else {
            Self::shrink(&mut shares, time_to_fill)?;
        }

        let mut paddings: Vec<PaddingAllocation> = shares
            .iter()
            .map(|share| {
                let fake = self
                    .grid
                    .round_minutes(share.fake)
                    .max(self.min_padding(share.ticket.real));
                PaddingAllocation::new(share.ticket.name.clone(), fake)
            })
            .collect();

        if time_to_fill > 0 {
            let reported: Minutes = real_sum + paddings.iter().map(|p| p.fake).sum::<Minutes>();
            let shortfall = weekly_target - reported;
            if shortfall > 0 {
                // Grid rounding lost a few minutes; the largest ticket absorbs them.
                paddings[0].fake += self.grid.ceil_to_step(shortfall);
            }
        }

        tracing::debug!(
            weekly_target,
            real_sum,
            time_to_fill,
            ?paddings,
            "heuristic balance"
        );
        Ok(paddings)
    }
}
