//! Command-line front end.

pub mod args;
pub mod commands;
pub mod console;

pub use args::{Cli, Commands, LogFormat, Verbosity};
