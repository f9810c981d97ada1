// file: src/venv/mod.rs
// version: 1.0.0
// guid: bf06cac8-6f3e-4c16-aa68-a2fe23854043

//! Python virtual environment handling
//!
//! A [`VenvRunner`] executes tools installed in a venv the way an activated
//! shell would: the venv `bin` directory goes first on `PATH`, `VIRTUAL_ENV`
//! points at the venv and `PYTHONHOME` is cleared.

use crate::utils::process::{self, ProcessOptions};
use crate::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Flag passed to every pip invocation
const PIP_QUIET_FLAG: &str = "--disable-pip-version-check";

/// Interpreter used to create venvs
const PYTHON: &str = "python3";

/// Runs executables installed in a virtual environment
#[derive(Debug, Clone)]
pub struct VenvRunner {
    root: PathBuf,
}

impl VenvRunner {
    /// Runner for the venv at `root`; relative roots are made absolute so the
    /// child can run from any working directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = if root.is_relative() {
            std::env::current_dir()
                .map(|cwd| cwd.join(&root))
                .unwrap_or(root)
        } else {
            root
        };

        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Path of `command` inside the venv
    pub fn resolve(&self, command: &str) -> PathBuf {
        self.bin_dir().join(command)
    }

    /// `PATH` with the venv bin directory prepended
    pub fn path_env(&self) -> Result<OsString> {
        let mut paths = vec![self.bin_dir()];
        if let Some(existing) = std::env::var_os("PATH") {
            paths.extend(std::env::split_paths(&existing));
        }
        std::env::join_paths(paths).map_err(|e| {
            crate::error::RunnerError::config(format!("Invalid PATH entry: {}", e))
        })
    }

    /// Process options that activate this venv
    pub fn activated(&self, capture: bool) -> Result<ProcessOptions> {
        let options = if capture {
            ProcessOptions::captured()
        } else {
            ProcessOptions::streaming()
        };
        Ok(options
            .env("PATH", self.path_env()?)
            .env("VIRTUAL_ENV", self.root.as_os_str())
            .env_remove("PYTHONHOME"))
    }

    /// Run `command` from the venv bin directory
    pub async fn run<S: AsRef<str>>(
        &self,
        command: &str,
        args: &[S],
        capture_output: bool,
    ) -> Result<String> {
        let options = self.activated(capture_output)?;
        self.run_with(command, args, options).await
    }

    /// Run `command` from the venv bin directory inside `dir`
    pub async fn run_in<S: AsRef<str>>(
        &self,
        dir: &Path,
        command: &str,
        args: &[S],
        capture_output: bool,
    ) -> Result<String> {
        let options = self.activated(capture_output)?.current_dir(dir);
        self.run_with(command, args, options).await
    }

    /// Run `command` inside `dir`, passing each stderr line to `on_stderr`
    /// while it runs. Stdout is captured.
    pub async fn run_in_forwarding<S, F>(
        &self,
        dir: &Path,
        command: &str,
        args: &[S],
        on_stderr: F,
    ) -> Result<String>
    where
        S: AsRef<str>,
        F: FnMut(&str),
    {
        let options = self.activated(true)?.current_dir(dir);
        let program = self.resolve(command);
        debug!("VIRTUAL_ENV={} running {}", self.root.display(), program.display());
        process::run_forwarding_stderr(&program, args, &options, on_stderr).await
    }

    async fn run_with<S: AsRef<str>>(
        &self,
        command: &str,
        args: &[S],
        options: ProcessOptions,
    ) -> Result<String> {
        let program = self.resolve(command);
        debug!("VIRTUAL_ENV={} running {}", self.root.display(), program.display());
        process::run(&program, args, &options).await
    }

    /// Create the venv with `python3 -m venv`
    pub async fn create(&self) -> Result<()> {
        let root = self.root.to_string_lossy();
        process::run(
            PYTHON,
            &["-m", "venv", &*root],
            &ProcessOptions::streaming(),
        )
        .await?;
        info!("created venv: {}", self.root.display());
        Ok(())
    }

    /// Install packages with the venv's pip
    pub async fn pip_install<S: AsRef<str>>(&self, packages: &[S]) -> Result<()> {
        let mut args = vec!["install".to_string()];
        for package in packages {
            let package: &str = package.as_ref();
            args.push(package.to_string());
        }
        args.push(PIP_QUIET_FLAG.to_string());
        self.run("pip3", &args, false).await?;
        Ok(())
    }

    /// Shell hint for activating the venv manually
    pub fn activate_hint(&self) -> String {
        format!("source {}", self.resolve("activate").display())
    }
}
