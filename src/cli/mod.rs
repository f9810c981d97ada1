// file: src/cli/mod.rs
// version: 1.0.0
// guid: 5c1e7a90-2d3b-4f68-a1c4-8e9b0d7f6a21

//! Command line interface for galaxy-runner

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::{run_cli, TaskContext};
