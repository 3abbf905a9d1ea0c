//! Shared components of the `amyed` command-line tool.

pub mod logging;
pub mod settings;
