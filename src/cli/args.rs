// file: src/cli/args.rs
// version: 1.0.0
// guid: 08a17c07-8bc7-47de-adf7-ac54bc5bdcf1

//! Command line argument definitions

use crate::tasks::Task;
use crate::version::BumpKind;
use crate::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "galaxy-runner")]
#[command(about = "Build, test and publish an Ansible collection")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Project config file (defaults to galaxy-runner.yaml in the project root)
    #[arg(long, global = true, env = "GALAXY_RUNNER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root containing galaxy.yml
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub project_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create working directories and set up every virtual environment
    Init,

    /// Remove build artifacts
    Clean,

    /// Remove build artifacts and cached virtual environments
    DeepClean,

    /// Create a virtual environment per Ansible version (without Ansible)
    PyInit,

    /// Create the CI virtual environment only
    PyInitSingle,

    /// Install Ansible into every virtual environment
    VenvInstall,

    /// Install Ansible into the CI virtual environment only
    VenvInstallSingle,

    /// Create every virtual environment and install Ansible into each
    Setup,

    /// Install a base Ansible version for the current user
    InstallBase {
        /// Ansible branch, e.g. stable-2.13 or devel
        #[arg(default_value = "")]
        target: String,
    },

    /// Install the collection with ansible-galaxy
    InstallCollection,

    /// Remove the installed collection
    UninstallCollection,

    /// Run sanity and unit tests
    Test,

    /// Run ansible-test sanity in a container
    TestSanity,

    /// Run ansible-test unit in a container
    TestUnit,

    /// Generate ansible-test coverage data
    Coverage,

    /// Run sanity tests inside every virtual environment
    VenvTestSanity,

    /// Validate required tools and environment variables
    Doctor {
        /// Print the report as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Bump the collection version in galaxy.yml
    Bump {
        /// major, minor or patch
        kind: String,
    },

    /// Write a changelog fragment and run antsibull-changelog release
    Changelog,

    /// Build the collection tarball
    Build,

    /// Build and publish the collection to a Galaxy server
    Publish,

    /// Prepare the CI virtual environment, build and publish
    Release,
}

impl Commands {
    /// Subcommand name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Commands::InstallBase { .. } => "install-base",
            Commands::Doctor { .. } => "doctor",
            Commands::Bump { .. } => "bump",
            other => other.to_task().map(|task| task.name()).unwrap_or("galaxy-runner"),
        }
    }

    /// Map the parsed command to its task, validating arguments
    pub fn to_task(&self) -> Result<Task> {
        Ok(match self {
            Commands::Init => Task::Init,
            Commands::Clean => Task::Clean,
            Commands::DeepClean => Task::DeepClean,
            Commands::PyInit => Task::PyInit,
            Commands::PyInitSingle => Task::PyInitSingle,
            Commands::VenvInstall => Task::VenvInstall,
            Commands::VenvInstallSingle => Task::VenvInstallSingle,
            Commands::Setup => Task::Setup,
            Commands::InstallBase { target } => Task::InstallBase(target.clone()),
            Commands::InstallCollection => Task::InstallCollection,
            Commands::UninstallCollection => Task::UninstallCollection,
            Commands::Test => Task::Test,
            Commands::TestSanity => Task::TestSanity,
            Commands::TestUnit => Task::TestUnit,
            Commands::Coverage => Task::Coverage,
            Commands::VenvTestSanity => Task::VenvTestSanity,
            Commands::Doctor { .. } => Task::Doctor,
            Commands::Bump { kind } => Task::Bump(kind.parse::<BumpKind>()?),
            Commands::Changelog => Task::Changelog,
            Commands::Build => Task::Build,
            Commands::Publish => Task::Publish,
            Commands::Release => Task::Release,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunnerError;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bump_parses_kind() {
        let cli = Cli::try_parse_from(["galaxy-runner", "bump", "minor"]).unwrap();
        assert_eq!(cli.command.to_task().unwrap(), Task::Bump(BumpKind::Minor));
    }

    #[test]
    fn test_bump_unknown_kind() {
        let cli = Cli::try_parse_from(["galaxy-runner", "bump", "huge"]).unwrap();
        assert!(matches!(
            cli.command.to_task(),
            Err(RunnerError::UnknownBumpKind(_))
        ));
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["galaxy-runner", "doctor", "--json", "-v", "-C", "/repo"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.project_dir, PathBuf::from("/repo"));
        assert!(matches!(cli.command, Commands::Doctor { json: true }));
    }

    #[test]
    fn test_install_base_without_target() {
        let cli = Cli::try_parse_from(["galaxy-runner", "install-base"]).unwrap();
        assert_eq!(
            cli.command.to_task().unwrap(),
            Task::InstallBase(String::new())
        );
    }
}
