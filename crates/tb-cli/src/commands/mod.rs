//! CLI subcommand implementations.

pub mod estimate;
pub mod track;
