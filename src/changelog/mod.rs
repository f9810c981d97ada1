// file: src/changelog/mod.rs
// version: 1.0.0
// guid: e5b34785-0e66-40da-9b32-209a9ffef9eb

//! Changelog fragments and the antsibull-changelog release step

use crate::config::ProjectConfig;
use crate::error::RunnerError;
use crate::venv::VenvRunner;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Package providing the changelog tool
pub const CHANGELOG_PACKAGE: &str = "antsibull-changelog";

/// Source of interactive answers
pub trait Prompt {
    /// Ask for a single line
    fn line(&mut self, question: &str) -> Result<String>;

    /// Ask for free text, terminated by an empty line or end of input
    fn multiline(&mut self, question: &str) -> Result<String>;
}

/// Prompt reading from any buffered reader, echoing questions to a writer
pub struct ReaderPrompt<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> ReaderPrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn ask(&mut self, question: &str) -> Result<()> {
        writeln!(self.writer, "{}", question)?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        if self.reader.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl<R: BufRead, W: Write> Prompt for ReaderPrompt<R, W> {
    fn line(&mut self, question: &str) -> Result<String> {
        self.ask(question)?;
        Ok(self.read_line()?.unwrap_or_default().trim().to_string())
    }

    fn multiline(&mut self, question: &str) -> Result<String> {
        self.ask(question)?;
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            if line.trim().is_empty() {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }
}

/// Prompt bound to the process's stdin and stdout
pub fn stdin_prompt() -> ReaderPrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    ReaderPrompt::new(std::io::stdin().lock(), std::io::stdout())
}

/// Contents of a release fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseFragment {
    pub release_summary: String,
}

impl ReleaseFragment {
    pub fn to_yaml(&self) -> Result<String> {
        let body = serde_yaml::to_string(self)?;
        Ok(format!("---\n{}", body))
    }
}

/// Path of the fragment for `version`
pub fn fragment_path(fragments_dir: &Path, version: &str) -> PathBuf {
    fragments_dir.join(format!("{}.yml", version))
}

/// Write `<fragments_dir>/<version>.yml` holding the release summary
pub fn write_fragment(fragments_dir: &Path, version: &str, summary: &str) -> Result<PathBuf> {
    let version = version.trim();
    if version.is_empty() || version.contains(['/', '\\']) {
        return Err(RunnerError::validation(format!(
            "Invalid fragment version {:?}",
            version
        )));
    }

    crate::utils::SystemUtils::create_dir(fragments_dir)?;
    let path = fragment_path(fragments_dir, version);
    let fragment = ReleaseFragment {
        release_summary: summary.to_string(),
    };
    std::fs::write(&path, fragment.to_yaml()?)?;
    info!("wrote changelog fragment: {}", path.display());
    Ok(path)
}

/// Ask for version and summary, then write the fragment
pub fn create_fragment(config: &ProjectConfig, prompt: &mut dyn Prompt) -> Result<PathBuf> {
    // Not checked against semver; antsibull-changelog rejects bad versions.
    let version = prompt.line("Enter semver version (example: 1.0.x)")?;
    info!("You answered: {}", version);

    let summary = prompt.multiline("Enter release summary (finish with an empty line)")?;
    info!("You answered: {}", summary);

    write_fragment(&config.fragments_dir, &version, &summary)
}

/// Run [`create_fragment`] on the blocking pool.
///
/// Reading from a terminal blocks the calling thread; keeping it off the
/// runtime thread lets the Ctrl+C handler run while the prompt waits.
pub async fn prompt_for_fragment<F, P>(config: &ProjectConfig, make_prompt: F) -> Result<PathBuf>
where
    F: FnOnce() -> P + Send + 'static,
    P: Prompt,
{
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let mut prompt = make_prompt();
        create_fragment(&config, &mut prompt)
    })
    .await
    .map_err(|e| RunnerError::config(format!("Changelog prompt did not complete: {}", e)))?
}

/// Create the tooling venv, install antsibull-changelog and run `release`
pub async fn release(config: &ProjectConfig, project_root: &Path) -> Result<()> {
    let tooling = VenvRunner::new(config.tooling_venv_path());
    tooling.create().await?;
    tooling.pip_install(&[CHANGELOG_PACKAGE]).await?;
    info!("installed {}", CHANGELOG_PACKAGE);

    tooling
        .run_in(project_root, CHANGELOG_PACKAGE, &["release"], false)
        .await?;
    Ok(())
}
