//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod reports;
pub mod seed;
pub mod tags;
