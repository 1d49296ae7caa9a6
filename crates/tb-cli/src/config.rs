//! Configuration loading and management.

use std::path::{Path, PathBuf};

use anyhow::ensure;
use clap::ValueEnum;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tb_core::{Balancer, Distributer, Engine, Grid, HeuristicBalancer, Minutes, OptimizingBalancer};

/// Padding strategy used by `tb track`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Greedy fill/shrink; always produces an answer.
    #[default]
    Heuristic,
    /// Linear program, falling back to the heuristic when infeasible.
    Optimizing,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Minutes of work per working day.
    pub day_capacity: Minutes,
    /// Default padding strategy.
    pub strategy: Strategy,
    /// Largest fraction of a ticket's real time that may be discounted.
    pub max_discount: f64,
    /// Extra fraction over the estimate gap the LP may pad a ticket.
    pub max_slack: f64,
    /// Weight reduction applied to overrunning tickets, in `[0, 1]`.
    pub deviation_penalty: f64,
    /// Rounding grid offset, in minutes; below the step.
    pub grid_lower: f64,
    /// Rounding grid upper point; the step is `grid_upper - grid_lower`.
    pub grid_upper: f64,
    /// Standard deviations added by `tb estimate`.
    pub risk: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            day_capacity: 8 * 60,
            strategy: Strategy::Heuristic,
            max_discount: 0.25,
            max_slack: 0.25,
            deviation_penalty: 0.5,
            grid_lower: 0.0,
            grid_upper: 5.0,
            risk: 2.0,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TB_*)
        figment = figment.merge(Env::prefixed("TB_"));

        figment.extract()
    }

    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.day_capacity > 0,
            "day_capacity must be positive (got {})",
            self.day_capacity
        );
        ensure!(
            self.max_discount >= 0.0,
            "max_discount must not be negative (got {})",
            self.max_discount
        );
        ensure!(
            self.max_slack >= 0.0,
            "max_slack must not be negative (got {})",
            self.max_slack
        );
        ensure!(
            (0.0..=1.0).contains(&self.deviation_penalty),
            "deviation_penalty must be within [0, 1] (got {})",
            self.deviation_penalty
        );
        ensure!(
            self.grid_upper > self.grid_lower && self.grid_lower >= 0.0,
            "grid must satisfy 0 <= grid_lower < grid_upper (got {}..{})",
            self.grid_lower,
            self.grid_upper
        );
        ensure!(
            self.grid_lower < self.grid_upper - self.grid_lower,
            "grid_lower must be smaller than the grid step (got {}..{})",
            self.grid_lower,
            self.grid_upper
        );
        ensure!(self.risk >= 0.0, "risk must not be negative (got {})", self.risk);
        Ok(())
    }

    pub const fn grid(&self) -> Grid {
        Grid::new(self.grid_lower, self.grid_upper)
    }

    /// Builds the balancer for `strategy`.
    pub fn balancer(&self, strategy: Strategy) -> Box<dyn Balancer> {
        let heuristic =
            HeuristicBalancer::new(self.deviation_penalty, self.max_discount, self.grid());
        match strategy {
            Strategy::Heuristic => Box::new(heuristic),
            Strategy::Optimizing => Box::new(OptimizingBalancer::new(
                self.max_discount,
                self.max_slack,
                self.grid(),
                Box::new(heuristic),
            )),
        }
    }

    /// Builds an engine, using the configured strategy unless overridden.
    pub fn engine(&self, strategy: Option<Strategy>) -> Engine {
        Engine::new(
            self.balancer(strategy.unwrap_or(self.strategy)),
            Distributer::new(self.day_capacity),
            self.grid(),
        )
    }
}

/// Returns the platform-specific config directory for tb.
///
/// On Linux: `~/.config/tb`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tb"))
}
