//! Focus tracker CLI library.
//!
//! This crate provides the `ft` binary's configuration, the async poll
//! loop, OS glue for sampling, and the reporting commands.

pub mod agent;
mod cli;
pub mod commands;
mod config;
pub mod lock;
pub mod monitor;
pub mod pulse;

pub use cli::{Cli, Commands};
pub use config::Config;
