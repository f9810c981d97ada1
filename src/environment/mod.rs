// file: src/environment/mod.rs
// version: 1.0.0
// guid: 7f7e3708-72eb-4369-9baf-f86ac3d0dc2c

//! Environment variable validation and the status report shared by `doctor`
//! and `publish`.

pub mod report;

pub use report::{CheckReport, CheckRow, CheckStatus};

use crate::error::RunnerError;
use crate::Result;
use std::collections::HashMap;

/// Marker shown in place of a secret value
pub const REDACTED: &str = "***** secret set, but not logged *****";

/// Environment variable the publish step targets
pub const GALAXY_SERVER: &str = "GALAXY_SERVER";

/// Environment variable holding the Galaxy API key
pub const GALAXY_KEY: &str = "GALAXY_KEY";

/// Describes one environment variable to check
#[derive(Debug, Clone)]
pub struct EnvCheckSpec {
    pub name: String,
    pub is_secret: bool,
    pub is_required: bool,
    pub notes: String,
}

impl EnvCheckSpec {
    /// Required, non-secret variable
    pub fn required(name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_secret: false,
            is_required: true,
            notes: notes.into(),
        }
    }

    /// Optional, non-secret variable
    pub fn optional(name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            is_required: false,
            ..Self::required(name, notes)
        }
    }

    /// Mark the value as secret so it never reaches the report
    pub fn secret(mut self) -> Self {
        self.is_secret = true;
        self
    }
}

/// The variables `publish` needs
pub fn publish_checks() -> Vec<EnvCheckSpec> {
    vec![
        EnvCheckSpec::required(GALAXY_SERVER, "required for defining target publish location"),
        EnvCheckSpec::required(GALAXY_KEY, "required for publishing").secret(),
    ]
}

/// Checks environment variables against a snapshot of the environment
pub struct EnvChecker {
    env_vars: HashMap<String, String>,
}

impl EnvChecker {
    /// Snapshot the current process environment
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Checker over an explicit set of variables
    pub fn with_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            env_vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set or override a variable
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }

    /// Remove a variable from the snapshot
    pub fn unset_env_var(&mut self, key: &str) {
        self.env_vars.remove(key);
    }

    /// Look up a variable without recording anything
    pub fn get(&self, name: &str) -> Option<&str> {
        self.env_vars.get(name).map(String::as_str)
    }

    /// Check one variable and append its row to `report`.
    ///
    /// Returns the raw value (secrets included) when set, an empty string for an
    /// unset optional variable, and `MissingRequiredVariable` otherwise.
    pub fn check(&self, spec: &EnvCheckSpec, report: &mut CheckReport) -> Result<String> {
        match self.env_vars.get(&spec.name) {
            Some(value) => {
                let shown = if spec.is_secret {
                    REDACTED.to_string()
                } else {
                    value.clone()
                };
                report.push(CheckRow::new(CheckStatus::Ok, &spec.name, shown, &spec.notes));
                Ok(value.clone())
            }
            None if spec.is_required => {
                report.push(CheckRow::new(CheckStatus::Failed, &spec.name, "", &spec.notes));
                Err(RunnerError::MissingRequiredVariable(spec.name.clone()))
            }
            None => {
                report.push(CheckRow::new(CheckStatus::Info, &spec.name, "", &spec.notes));
                Ok(String::new())
            }
        }
    }

    /// Check every spec, recording all rows before failing.
    ///
    /// The returned map holds values for the variables that passed. When any
    /// required variable is missing, the first such error is returned.
    pub fn check_all(
        &self,
        specs: &[EnvCheckSpec],
        report: &mut CheckReport,
    ) -> Result<HashMap<String, String>> {
        let mut values = HashMap::new();
        let mut first_error = None;

        for spec in specs {
            match self.check(spec, report) {
                Ok(value) => {
                    values.insert(spec.name.clone(), value);
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(values),
        }
    }
}

impl Default for EnvChecker {
    fn default() -> Self {
        Self::new()
    }
}
