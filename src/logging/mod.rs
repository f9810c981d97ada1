// file: src/logging/mod.rs
// version: 1.0.0
// guid: 232c709a-c747-457e-ac4b-2ce9bbf58a08

//! Logging setup for galaxy-runner

pub mod logger;

pub use logger::{init_json_logger, init_logger};
