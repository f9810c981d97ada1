// file: src/lib.rs
// version: 1.0.0
// guid: 0e6d4b2a-7c15-4f93-b8a0-3d9e1f52c746

//! # galaxy-runner
//!
//! Task runner for building, testing and publishing an Ansible collection.
//! Tasks declare their prerequisites and run serially; each one drives host
//! tools (`python3`, `ansible-galaxy`, `ansible-test`, `yq`) inside per-version
//! Python virtual environments.

pub mod archive;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod tasks;
pub mod utils;
pub mod venv;
pub mod version;

pub use error::{Result, RunnerError};

/// Version information for the runner
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
