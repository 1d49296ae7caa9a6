//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Strategy;

/// Weekly time report balancer.
///
/// Pads logged ticket times up (or down) to the week's working capacity and
/// spreads the result across the working days.
#[derive(Debug, Parser)]
#[command(name = "tb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Balance a week of logged tickets and distribute it across days.
    Track {
        /// CSV time log with `ticket,estimate,day,start,end` columns.
        log: PathBuf,

        /// Padding strategy (defaults to the configured one).
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compute a three-point estimate from subtask guesses.
    Estimate {
        /// CSV file with `subtask,best,likely,worst` columns.
        guesses: PathBuf,

        /// Standard deviations to add (defaults to the configured risk).
        #[arg(long)]
        risk: Option<f64>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
