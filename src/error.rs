// file: src/error.rs
// version: 1.0.0
// guid: e31e821d-5ded-4c37-a079-4f41c5d21cc3

use thiserror::Error;

/// Result type alias for the runner
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Error types for galaxy-runner tasks
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} is required and not set")]
    MissingRequiredVariable(String),

    #[error("invalid semantic version {version:?}: {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("unknown bump type: {0} (expected major, minor or patch)")]
    UnknownBumpKind(String),

    #[error("no archive found with pattern {0:?}")]
    ArchiveNotFound(String),

    #[error("pattern {pattern:?} matched {} archives: {}", .matches.len(), .matches.join(", "))]
    AmbiguousArchive {
        pattern: String,
        matches: Vec<String>,
    },

    #[error("corrupt archive {path}: {reason}")]
    CorruptArchive { path: String, reason: String },

    #[error("command `{command}` failed with exit code {exit_code:?}: {stderr}")]
    ExecutionFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{failed} of {total} steps failed in {task}")]
    PartialFailure {
        task: String,
        failed: usize,
        total: usize,
    },

    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("this command is only supported on Linux or Darwin and you are on: {0}")]
    UnsupportedPlatform(String),

    #[error("task dependency cycle detected at {0}")]
    TaskCycle(String),

    #[error("required checks failed: {0}")]
    ChecksFailed(usize),
}

impl RunnerError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an execution error for a process that never produced an exit code
    pub fn spawn_failed(command: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::ExecutionFailed {
            command: command.into(),
            exit_code: None,
            stderr: format!("Failed to execute command: {}", err),
        }
    }

    /// Exit code of a failed child process, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExecutionFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}
