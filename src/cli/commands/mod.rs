//! CLI subcommands.

pub mod container;
pub mod info;
