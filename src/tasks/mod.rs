// file: src/tasks/mod.rs
// version: 1.0.0
// guid: 9dbb8094-b94d-439d-946c-d590c968600a

//! Task registry and serial dependency execution
//!
//! Every task names the tasks that must finish before it. Planning walks those
//! prerequisites depth-first, in declaration order, so a task's dependencies
//! always run first and each task runs at most once per invocation.

use crate::error::RunnerError;
use crate::version::BumpKind;
use crate::Result;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// A runnable unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Create working directories and, outside CI, the full venv setup
    Init,
    /// Reset the artifact directory
    Clean,
    /// Reset artifacts and remove every cached venv
    DeepClean,
    /// Create one venv per Ansible version
    PyInit,
    /// Create the CI venv only
    PyInitSingle,
    /// Install Ansible into every venv
    VenvInstall,
    /// Install Ansible into the CI venv only
    VenvInstallSingle,
    /// Create all venvs and install Ansible into them
    Setup,
    /// Install an Ansible version into the user site-packages
    InstallBase(String),
    /// Install the collection with ansible-galaxy
    InstallCollection,
    /// Remove the installed collection
    UninstallCollection,
    /// ansible-test sanity in a container
    TestSanity,
    /// ansible-test unit in a container
    TestUnit,
    /// Sanity and unit tests
    Test,
    /// ansible-test coverage report
    Coverage,
    /// Sanity tests in every venv
    VenvTestSanity,
    /// Validate environment variables and tools
    Doctor,
    /// Bump the manifest version
    Bump(BumpKind),
    /// Write a changelog fragment and run the release tool
    Changelog,
    /// Build the collection tarball
    Build,
    /// Publish the built tarball
    Publish,
    /// Prepare the CI venv, build and publish
    Release,
}

impl Task {
    /// Command-line name of the task
    pub fn name(&self) -> &'static str {
        match self {
            Task::Init => "init",
            Task::Clean => "clean",
            Task::DeepClean => "deep-clean",
            Task::PyInit => "py-init",
            Task::PyInitSingle => "py-init-single",
            Task::VenvInstall => "venv-install",
            Task::VenvInstallSingle => "venv-install-single",
            Task::Setup => "setup",
            Task::InstallBase(_) => "install-base",
            Task::InstallCollection => "install-collection",
            Task::UninstallCollection => "uninstall-collection",
            Task::TestSanity => "test-sanity",
            Task::TestUnit => "test-unit",
            Task::Test => "test",
            Task::Coverage => "coverage",
            Task::VenvTestSanity => "venv-test-sanity",
            Task::Doctor => "doctor",
            Task::Bump(_) => "bump",
            Task::Changelog => "changelog",
            Task::Build => "build",
            Task::Publish => "publish",
            Task::Release => "release",
        }
    }

    /// Tasks that must complete first, in order.
    ///
    /// `ci` drops the venv setup from `init`, which is too slow for CI runners.
    pub fn prerequisites(&self, ci: bool) -> Vec<Task> {
        match self {
            Task::Init if ci => vec![],
            Task::Init => vec![Task::Setup],
            Task::Setup => vec![Task::PyInit, Task::VenvInstall],
            Task::Test => vec![Task::TestSanity, Task::TestUnit],
            Task::Publish => vec![Task::Build],
            Task::Release => vec![Task::PyInitSingle, Task::VenvInstallSingle, Task::Publish],
            _ => vec![],
        }
    }

    /// Tasks relying on the venv `bin/` layout and `:`-separated PATH
    pub fn requires_unix(&self) -> bool {
        matches!(self, Task::VenvTestSanity | Task::Changelog | Task::Release)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::InstallBase(target) => write!(f, "install-base {}", target),
            Task::Bump(kind) => write!(f, "bump {}", kind),
            other => f.write_str(other.name()),
        }
    }
}

/// Serial execution order for `task`: prerequisites first, no duplicates
pub fn plan(task: &Task, ci: bool) -> Result<Vec<Task>> {
    let mut ordered = Vec::new();
    let mut visiting = Vec::new();
    visit(task, ci, &mut visiting, &mut ordered)?;
    Ok(ordered)
}

fn visit(task: &Task, ci: bool, visiting: &mut Vec<Task>, ordered: &mut Vec<Task>) -> Result<()> {
    if ordered.contains(task) {
        return Ok(());
    }
    if visiting.contains(task) {
        return Err(RunnerError::TaskCycle(task.to_string()));
    }

    visiting.push(task.clone());
    for dep in task.prerequisites(ci) {
        visit(&dep, ci, visiting, ordered)?;
    }
    visiting.pop();

    ordered.push(task.clone());
    Ok(())
}

/// Outcome of a task in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    Failed,
    /// Not started because an earlier task failed
    Skipped,
}

/// Record of a single task execution
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub task: Task,
    pub status: TaskStatus,
    pub elapsed: Duration,
}

/// Run `tasks` in order, stopping at the first failure.
///
/// Results cover every task in the plan; the first error is returned after
/// the summary is logged. Completed work is left in place.
pub async fn run_plan<F, Fut>(tasks: &[Task], mut execute: F) -> (Vec<TaskResult>, Result<()>)
where
    F: FnMut(Task) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut results = Vec::with_capacity(tasks.len());
    let mut outcome = Ok(());

    for task in tasks {
        if outcome.is_err() {
            results.push(TaskResult {
                task: task.clone(),
                status: TaskStatus::Skipped,
                elapsed: Duration::ZERO,
            });
            continue;
        }

        let started = Instant::now();
        let result = crate::logging::logger::with_async_operation_span(task.name(), || {
            execute(task.clone())
        })
        .await;
        let elapsed = started.elapsed();

        let status = match result {
            Ok(()) => {
                info!("{} completed in {:.1}s", task, elapsed.as_secs_f64());
                TaskStatus::Completed
            }
            Err(e) => {
                error!("{} failed: {}", task, e);
                outcome = Err(e);
                TaskStatus::Failed
            }
        };

        results.push(TaskResult {
            task: task.clone(),
            status,
            elapsed,
        });
    }

    if results.len() > 1 {
        log_summary(&results);
    }
    (results, outcome)
}

fn log_summary(results: &[TaskResult]) {
    for result in results {
        match result.status {
            TaskStatus::Completed => {
                info!("  ✓ {:<24} {:>7.1}s", result.task.to_string(), result.elapsed.as_secs_f64())
            }
            TaskStatus::Failed => {
                error!("  ✗ {:<24} {:>7.1}s", result.task.to_string(), result.elapsed.as_secs_f64())
            }
            TaskStatus::Skipped => warn!("  - {:<24} skipped", result.task.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_single_task() {
        assert_eq!(plan(&Task::Doctor, false).unwrap(), vec![Task::Doctor]);
    }

    #[test]
    fn test_plan_orders_prerequisites_first() {
        assert_eq!(
            plan(&Task::Test, false).unwrap(),
            vec![Task::TestSanity, Task::TestUnit, Task::Test]
        );
        assert_eq!(
            plan(&Task::Release, false).unwrap(),
            vec![
                Task::PyInitSingle,
                Task::VenvInstallSingle,
                Task::Build,
                Task::Publish,
                Task::Release
            ]
        );
    }

    #[test]
    fn test_plan_init_depends_on_ci() {
        assert_eq!(plan(&Task::Init, true).unwrap(), vec![Task::Init]);
        assert_eq!(
            plan(&Task::Init, false).unwrap(),
            vec![Task::PyInit, Task::VenvInstall, Task::Setup, Task::Init]
        );
    }

    #[test]
    fn test_display_includes_arguments() {
        assert_eq!(Task::Bump(BumpKind::Minor).to_string(), "bump minor");
        assert_eq!(
            Task::InstallBase("stable-2.13".to_string()).to_string(),
            "install-base stable-2.13"
        );
        assert_eq!(Task::DeepClean.to_string(), "deep-clean");
    }

    #[tokio::test]
    async fn test_run_plan_executes_in_order() {
        let mut seen = Vec::new();
        let tasks = plan(&Task::Publish, false).unwrap();

        let (results, outcome) = run_plan(&tasks, |task| {
            seen.push(task);
            async { Ok(()) }
        })
        .await;

        assert!(outcome.is_ok());
        assert_eq!(seen, vec![Task::Build, Task::Publish]);
        assert!(results.iter().all(|r| r.status == TaskStatus::Completed));
    }

    #[tokio::test]
    async fn test_run_plan_stops_at_first_failure() {
        let mut seen = Vec::new();
        let tasks = plan(&Task::Release, false).unwrap();

        let (results, outcome) = run_plan(&tasks, |task| {
            let fail = task == Task::Build;
            seen.push(task);
            async move {
                if fail {
                    Err(RunnerError::ExecutionFailed {
                        command: "ansible-galaxy collection build".to_string(),
                        exit_code: Some(1),
                        stderr: String::new(),
                    })
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(outcome.unwrap_err().exit_code(), Some(1));
        assert_eq!(seen.len(), 3);
        let statuses: Vec<TaskStatus> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                TaskStatus::Completed,
                TaskStatus::Completed,
                TaskStatus::Failed,
                TaskStatus::Skipped,
                TaskStatus::Skipped
            ]
        );
    }
}
