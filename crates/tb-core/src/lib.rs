//! Core domain logic for weekly time report balancing.
//!
//! This crate contains the fundamental types and logic for:
//! - Aggregation: folding a raw time log into per-ticket totals
//! - Balancing: padding ticket times so the week reaches its target
//! - Distribution: packing ticket totals into working days
//! - Estimation: three-point (PERT) task estimates

mod balance;
mod distribute;
mod engine;
pub mod lp;
mod optimize;
pub mod pert;
pub mod rounding;
mod ticket;
pub mod time;

pub use balance::{BalanceError, Balancer, HeuristicBalancer, PaddingAllocation};
pub use distribute::{DaySlice, DistributeError, Distributer};
pub use engine::{Engine, EngineError, SummaryRow, TOTAL_LABEL, WeekReport};
pub use optimize::OptimizingBalancer;
pub use rounding::{Grid, round_to_grid};
pub use ticket::{AggregateError, LogRow, PREVIOUS_TICKET_MARKER, Ticket, WorkingDays, aggregate};
pub use time::{Minutes, WEEK_MINUTES};
