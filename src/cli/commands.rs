// file: src/cli/commands.rs
// version: 1.0.0
// guid: 3b0f6c2e-9a41-4d7e-8e55-61c2d4a7f913

//! Task implementations for the CLI

use crate::{
    archive, changelog,
    cli::args::{Cli, Commands},
    config::{loader::ConfigLoader, ProjectConfig},
    environment::{
        self, CheckReport, CheckRow, CheckStatus, EnvCheckSpec, EnvChecker, GALAXY_KEY,
        GALAXY_SERVER,
    },
    error::RunnerError,
    manifest::Manifest,
    tasks::{self, Task},
    utils::{
        process::{self, ProcessOptions},
        system::SystemUtils,
    },
    venv::VenvRunner,
    version::{self, BumpKind},
    Result,
};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

const ANSIBLE_GALAXY: &str = "ansible-galaxy";
const ANSIBLE_TEST: &str = "ansible-test";
const PYTHON: &str = "python3";
const YQ: &str = "yq";

const SANITY_ARGS: &[&str] = &["sanity", "--docker", "-v", "--color", "--coverage"];
const UNIT_ARGS: &[&str] = &["unit", "--docker", "-v", "--color", "--coverage"];
const COVERAGE_ARGS: &[&str] = &[
    "coverage",
    "xml",
    "-v",
    "--requirements",
    "--group-by",
    "command",
    "--group-by",
    "version",
];

/// Everything a task needs: the project config, where the project lives and
/// a snapshot of the environment.
pub struct TaskContext {
    config: ProjectConfig,
    project_root: PathBuf,
    env: EnvChecker,
    home: Option<PathBuf>,
    yq: String,
    json_report: bool,
}

impl TaskContext {
    pub fn new(config: ProjectConfig, project_root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            project_root: project_root.into(),
            env: EnvChecker::new(),
            home: None,
            yq: YQ.to_string(),
            json_report: false,
        }
    }

    /// Replace the environment snapshot
    pub fn with_env(mut self, env: EnvChecker) -> Self {
        self.env = env;
        self
    }

    /// Use `home` instead of the user's home directory
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Use a specific `yq` binary for the manifest
    pub fn with_yq(mut self, yq: impl Into<String>) -> Self {
        self.yq = yq.into();
        self
    }

    /// Print the doctor report as JSON instead of a table
    pub fn with_json_report(mut self, json: bool) -> Self {
        self.json_report = json;
        self
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    fn is_ci(&self) -> bool {
        SystemUtils::is_ci_value(self.env.get("CI"))
    }

    fn home(&self) -> Result<PathBuf> {
        match &self.home {
            Some(home) => Ok(home.clone()),
            None => SystemUtils::home_dir(),
        }
    }

    fn ci_venv(&self) -> VenvRunner {
        VenvRunner::new(self.config.venv_path(&self.config.ci_version))
    }

    /// Plan `task` with its prerequisites and run them in order
    pub async fn run(&self, task: &Task) -> Result<()> {
        let plan = tasks::plan(task, self.is_ci())?;
        debug!(
            "plan: {}",
            plan.iter().map(Task::name).collect::<Vec<_>>().join(" -> ")
        );

        if plan.iter().any(Task::requires_unix) {
            SystemUtils::ensure_unix()?;
        }
        if plan.contains(&Task::Setup) {
            warn!("setting up every virtual environment, this might take up to 8 minutes");
        }

        let (_results, outcome) = tasks::run_plan(&plan, |task| self.execute(task)).await;
        outcome
    }

    /// Run a single task body, without its prerequisites
    pub async fn execute(&self, task: Task) -> Result<()> {
        match task {
            Task::Init => self.init(),
            Task::Clean => self.clean(),
            Task::DeepClean => self.deep_clean(),
            Task::PyInit => self.py_init(&self.config.ansible_versions).await,
            Task::PyInitSingle => {
                self.py_init(std::slice::from_ref(&self.config.ci_version))
                    .await
            }
            Task::VenvInstall => {
                self.venv_install(Task::VenvInstall.name(), &self.config.ansible_versions)
                    .await
            }
            Task::VenvInstallSingle => {
                let ci_version = std::slice::from_ref(&self.config.ci_version);
                self.venv_install(Task::VenvInstallSingle.name(), ci_version)
                    .await
            }
            Task::Setup => {
                info!("virtual environments ready in {}", self.config.venv_dir.display());
                Ok(())
            }
            Task::InstallBase(target) => self.install_base(&target).await,
            Task::InstallCollection => self.install_collection().await,
            Task::UninstallCollection => self.uninstall_collection(),
            Task::TestSanity => self.ansible_test(SANITY_ARGS).await,
            Task::TestUnit => self.ansible_test(UNIT_ARGS).await,
            Task::Test => {
                info!("sanity and unit tests passed");
                Ok(())
            }
            Task::Coverage => self.ansible_test(COVERAGE_ARGS).await,
            Task::VenvTestSanity => self.venv_test_sanity().await,
            Task::Doctor => self.doctor().await,
            Task::Bump(kind) => self.bump(kind).await,
            Task::Changelog => self.changelog().await,
            Task::Build => self.build().await,
            Task::Publish => self.publish().await,
            Task::Release => {
                info!("released {}", self.config.collection_name());
                Ok(())
            }
        }
    }

    fn create_directories(&self) {
        SystemUtils::create_dirs_lenient(&[&self.config.artifact_dir, &self.config.venv_dir]);
    }

    fn init(&self) -> Result<()> {
        self.create_directories();
        if self.is_ci() {
            info!("CI detected, skipping virtual environment setup");
        } else {
            info!(
                "activate an environment manually with: {}",
                self.ci_venv().activate_hint()
            );
        }
        Ok(())
    }

    fn clean(&self) -> Result<()> {
        SystemUtils::remove_dir(&self.config.artifact_dir)?;
        self.create_directories();
        info!("reset {}", self.config.artifact_dir.display());
        Ok(())
    }

    fn deep_clean(&self) -> Result<()> {
        SystemUtils::remove_dir(&self.config.artifact_dir)?;
        SystemUtils::remove_dir(&self.config.venv_dir)?;
        self.create_directories();
        info!(
            "reset {} and {}",
            self.config.artifact_dir.display(),
            self.config.venv_dir.display()
        );
        Ok(())
    }

    async fn py_init(&self, versions: &[String]) -> Result<()> {
        SystemUtils::create_dir(&self.config.venv_dir)?;
        for version in versions {
            VenvRunner::new(self.config.venv_path(version)).create().await?;
        }
        Ok(())
    }

    /// Install wheel and Ansible into each venv. A failing version does not
    /// stop the others; the failure count is returned at the end.
    async fn venv_install(&self, task: &str, versions: &[String]) -> Result<()> {
        let mut failed = 0;
        for version in versions {
            let venv = VenvRunner::new(self.config.venv_path(version));
            let url = self.config.download_url(version);

            let installed = match venv.pip_install(&["wheel"]).await {
                Ok(()) => venv.pip_install(&[url.as_str()]).await,
                Err(e) => Err(e),
            };
            match installed {
                Ok(()) => info!("installed ansible {} into {}", version, venv.root().display()),
                Err(e) => {
                    error!("failed to install ansible {}: {}", version, e);
                    failed += 1;
                }
            }
            info!("activate with: {}", venv.activate_hint());
        }

        if failed > 0 {
            return Err(RunnerError::PartialFailure {
                task: task.to_string(),
                failed,
                total: versions.len(),
            });
        }
        Ok(())
    }

    async fn install_base(&self, target: &str) -> Result<()> {
        if target.is_empty() {
            return Err(RunnerError::MissingParameter(format!(
                "target version, one of: {}",
                self.config.ansible_versions.join(", ")
            )));
        }

        let url = self.config.download_url(target);
        info!("installing ansible {} for the current user", target);
        process::run(
            PYTHON,
            &[
                "-m",
                "pip",
                "install",
                url.as_str(),
                "--disable-pip-version-check",
                "--user",
            ],
            &ProcessOptions::streaming(),
        )
        .await?;
        Ok(())
    }

    async fn install_collection(&self) -> Result<()> {
        let name = self.config.collection_name();
        process::run(
            ANSIBLE_GALAXY,
            &["collection", "install", name.as_str()],
            &ProcessOptions::streaming(),
        )
        .await?;
        info!("installed {}", name);
        Ok(())
    }

    fn uninstall_collection(&self) -> Result<()> {
        let dir = self.config.installed_collection_dir(&self.home()?);
        if !dir.exists() {
            info!("{} is not installed", self.config.collection_name());
            return Ok(());
        }
        SystemUtils::remove_dir(&dir)?;
        info!("removed {}", dir.display());
        Ok(())
    }

    async fn ansible_test(&self, args: &[&str]) -> Result<()> {
        process::run(
            ANSIBLE_TEST,
            args,
            &ProcessOptions::streaming().current_dir(&self.project_root),
        )
        .await?;
        Ok(())
    }

    async fn venv_test_sanity(&self) -> Result<()> {
        SystemUtils::ensure_unix()?;
        let collection_dir = self.config.installed_collection_dir(&self.home()?);
        if !collection_dir.is_dir() {
            warn!(
                "{} not found, run `galaxy-runner install-collection` first",
                collection_dir.display()
            );
        }

        let mut args: Vec<String> = SANITY_ARGS.iter().map(|a| a.to_string()).collect();
        if !self.config.sanity_skip_tests.is_empty() {
            args.push("--skip-test".to_string());
            args.push(self.config.sanity_skip_tests.join(","));
        }

        let versions = &self.config.ansible_versions;
        let pb = progress_bar(versions.len() as u64);
        let mut failed = 0;
        for version in versions {
            pb.set_message(version.clone());
            let venv = VenvRunner::new(self.config.venv_path(version));
            let run = venv.run_in_forwarding(&collection_dir, ANSIBLE_TEST, &args, |line| {
                pb.println(line)
            });
            match run.await {
                Ok(output) => pb.suspend(|| {
                    print!("{}", output);
                    info!("sanity passed on {}", version)
                }),
                Err(e) => {
                    pb.suspend(|| error!("sanity failed on {}: {}", version, e));
                    failed += 1;
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        if failed > 0 {
            return Err(RunnerError::PartialFailure {
                task: Task::VenvTestSanity.name().to_string(),
                failed,
                total: versions.len(),
            });
        }
        Ok(())
    }

    async fn doctor(&self) -> Result<()> {
        let mut report = CheckReport::new();
        report.push(CheckRow::new(CheckStatus::Ok, "OS", std::env::consts::OS, ""));
        report.push(CheckRow::new(CheckStatus::Ok, "ARCH", std::env::consts::ARCH, ""));
        report.push(CheckRow::new(
            CheckStatus::Ok,
            "galaxy-runner",
            crate::VERSION,
            "",
        ));

        let mut specs = vec![EnvCheckSpec::optional(
            "HOME",
            "locates installed collections",
        )];
        specs.extend(environment::publish_checks());
        // Missing variables show up as failed rows; the count decides the outcome.
        let _ = self.env.check_all(&specs, &mut report);

        let galaxy_line = Regex::new(r"(?m)^ansible-galaxy.*$")
            .map_err(|e| RunnerError::config(format!("Invalid version pattern: {}", e)))?;
        tool_row(
            &mut report,
            ANSIBLE_GALAXY,
            Some(&galaxy_line),
            "required for build and publish",
        )
        .await;
        tool_row(&mut report, PYTHON, None, "required for virtual environments").await;

        if SystemUtils::command_exists(&self.yq) {
            report.push(CheckRow::new(CheckStatus::Ok, YQ, self.yq.as_str(), "used by bump"));
        } else {
            report.push(CheckRow::new(CheckStatus::Info, YQ, "", "required for bump"));
        }

        if self.json_report {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            report.print();
        }

        match report.failure_count() {
            0 => Ok(()),
            count => Err(RunnerError::ChecksFailed(count)),
        }
    }

    async fn bump(&self, kind: BumpKind) -> Result<()> {
        info!("bump type: {}", kind);
        let manifest = Manifest::new(&self.config.manifest).with_yq(self.yq.as_str());
        let current = manifest.read_version().await?;
        let next = version::bump(&current, kind)?;
        info!("bumping {} -> {}", current, next);
        manifest.write_version(&next).await
    }

    async fn changelog(&self) -> Result<()> {
        SystemUtils::ensure_unix()?;
        changelog::prompt_for_fragment(&self.config, changelog::stdin_prompt).await?;
        changelog::release(&self.config, &self.project_root).await
    }

    async fn build(&self) -> Result<()> {
        let venv = self.ci_venv();
        venv.run(ANSIBLE_GALAXY, &["--version"], false).await?;

        SystemUtils::create_dir(&self.config.artifact_dir)?;
        let output = self.config.artifact_dir.to_string_lossy();
        venv.run_in(
            &self.project_root,
            ANSIBLE_GALAXY,
            &[
                "collection",
                "build",
                "-v",
                "--force",
                "--output-path",
                &*output,
            ],
            false,
        )
        .await?;
        info!("built {} into {}", self.config.collection_name(), output);
        Ok(())
    }

    async fn publish(&self) -> Result<()> {
        let archive =
            archive::find_archive(&self.config.artifact_dir, &self.config.archive_pattern())?;
        let entries = archive::list_entries(&archive)?;
        for entry in &entries {
            println!("{}", entry);
        }
        info!("{} entries in {}", entries.len(), archive.display());

        let mut report = CheckReport::new();
        let values = match self
            .env
            .check_all(&environment::publish_checks(), &mut report)
        {
            Ok(values) => values,
            Err(e) => {
                report.print();
                warn!("{} or {} not set, skipping publish", GALAXY_KEY, GALAXY_SERVER);
                return Err(e);
            }
        };
        let server = values.get(GALAXY_SERVER).map(String::as_str).unwrap_or_default();
        let key = values.get(GALAXY_KEY).map(String::as_str).unwrap_or_default();

        let archive_arg = archive.to_string_lossy();
        self.ci_venv()
            .run_in(
                &self.project_root,
                ANSIBLE_GALAXY,
                &[
                    "collection",
                    "publish",
                    "-v",
                    "--server",
                    server,
                    "--api-key",
                    key,
                    &*archive_arg,
                ],
                false,
            )
            .await?;
        info!("published {} to {}", archive.display(), server);
        Ok(())
    }
}

/// Run a tool with `--version` and record the result in `report`.
///
/// With a pattern, the first matching line is shown; otherwise the first
/// line of output.
async fn tool_row(report: &mut CheckReport, tool: &str, pattern: Option<&Regex>, notes: &str) {
    match process::run(tool, &["--version"], &ProcessOptions::captured()).await {
        Ok(output) => {
            let line = match pattern {
                Some(re) => re.find(&output).map(|m| m.as_str().trim().to_string()),
                None => output.lines().next().map(|l| l.trim().to_string()),
            };
            match line {
                Some(line) => report.push(CheckRow::new(CheckStatus::Ok, tool, line, notes)),
                None => report.push(CheckRow::new(
                    CheckStatus::Failed,
                    tool,
                    "",
                    format!("unexpected --version output; {}", notes),
                )),
            }
        }
        Err(e) => {
            debug!("{} --version failed: {}", tool, e);
            report.push(CheckRow::new(
                CheckStatus::Failed,
                tool,
                "",
                format!("not runnable; {}", notes),
            ));
        }
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Load the project config and run the requested task with its prerequisites
pub async fn run_cli(cli: &Cli) -> Result<()> {
    let task = cli.command.to_task()?;
    let config = ConfigLoader::new().load_project(&cli.project_dir, cli.config.as_deref())?;
    let json_report = matches!(cli.command, Commands::Doctor { json: true });

    TaskContext::new(config, &cli.project_dir)
        .with_json_report(json_report)
        .run(&task)
        .await
}
