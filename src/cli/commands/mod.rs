//! CLI subcommands

pub mod inspect;
pub mod stats;
pub mod train;
