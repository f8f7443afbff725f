//! Command-line front end: configuration, logging, resource files, state
//! and the commands that drive the alert rule provider.

pub mod cli;
pub mod commands;
pub mod config;
pub mod manifest;
pub mod observability;
pub mod output;
pub mod state;
