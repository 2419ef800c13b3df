//! Command-line shell over the ideals tracker.

pub mod command;
pub mod config;
pub mod run;

pub use command::{Cli, Command};
pub use config::CliConfig;
