//! Command-line client for the Cronofy API.
//!
//! This crate provides the `chronofy` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod secret;

pub use cli::Cli;
pub use error::{CliError, CliResult};
