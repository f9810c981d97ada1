// file: src/utils/mod.rs
// version: 1.0.0
// guid: 635c04e8-4d2b-407b-96e7-4f2f0d30ce22

//! Utility modules for system operations

pub mod process;
pub mod system;

pub use process::{display_command, ProcessOptions};
pub use system::SystemUtils;
