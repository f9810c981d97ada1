// file: src/utils/process.rs
// version: 1.0.0
// guid: 7cce2ec2-23cf-4b7b-b52a-da6b1acfaf73

//! Child process execution for host tools

use crate::error::RunnerError;
use crate::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error};

/// Arguments whose following value must never be logged
const SECRET_FLAGS: &[&str] = &["--api-key", "--token"];

/// Trailing stderr lines kept for the error of a forwarded run
const STDERR_TAIL_LINES: usize = 20;

/// How a child process is launched
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Working directory for the child
    pub cwd: Option<PathBuf>,
    /// Variables set on top of the inherited environment
    pub envs: Vec<(String, OsString)>,
    /// Variables removed from the inherited environment
    pub env_remove: Vec<String>,
    /// Capture stdout instead of streaming it to the console
    pub capture: bool,
}

impl ProcessOptions {
    /// Stream output to the console
    pub fn streaming() -> Self {
        Self::default()
    }

    /// Capture stdout and return it
    pub fn captured() -> Self {
        Self {
            capture: true,
            ..Self::default()
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }
}

/// Run `program` with `args`, waiting for it to exit.
///
/// Returns captured stdout when `options.capture` is set, otherwise an empty
/// string. A non-zero exit maps to `ExecutionFailed`.
pub async fn run<S: AsRef<str>>(
    program: impl AsRef<Path>,
    args: &[S],
    options: &ProcessOptions,
) -> Result<String> {
    let program = program.as_ref();
    let rendered = display_command(&program.to_string_lossy(), args);
    debug!("Executing: {}", rendered);

    let mut cmd = build_command(program, args, options);
    if options.capture {
        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RunnerError::spawn_failed(&rendered, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            error!("Command failed with exit code {:?}", output.status.code());
            return Err(RunnerError::ExecutionFailed {
                command: rendered,
                exit_code: output.status.code(),
                stderr: if stderr.trim().is_empty() { stdout } else { stderr },
            });
        }

        debug!("Command executed successfully: {} bytes of output", stdout.len());
        Ok(stdout)
    } else {
        let status = cmd
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| RunnerError::spawn_failed(&rendered, e))?;

        if !status.success() {
            error!("Command failed with exit code {:?}", status.code());
            return Err(RunnerError::ExecutionFailed {
                command: rendered,
                exit_code: status.code(),
                stderr: String::new(),
            });
        }

        debug!("Command executed successfully");
        Ok(String::new())
    }
}

/// Run `program`, handing each stderr line to `on_stderr` as it arrives.
///
/// Stdout is captured and returned. The last stderr lines are kept for the
/// `ExecutionFailed` error on a non-zero exit.
pub async fn run_forwarding_stderr<S, F>(
    program: impl AsRef<Path>,
    args: &[S],
    options: &ProcessOptions,
    mut on_stderr: F,
) -> Result<String>
where
    S: AsRef<str>,
    F: FnMut(&str),
{
    let program = program.as_ref();
    let rendered = display_command(&program.to_string_lossy(), args);
    debug!("Executing: {}", rendered);

    let mut child = build_command(program, args, options)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| RunnerError::spawn_failed(&rendered, e))?;

    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let read_stdout = async {
        let mut out = String::new();
        if let Some(mut pipe) = stdout_pipe {
            pipe.read_to_string(&mut out).await?;
        }
        Ok::<_, std::io::Error>(out)
    };
    let forward_stderr = async {
        let mut tail = std::collections::VecDeque::with_capacity(STDERR_TAIL_LINES);
        if let Some(pipe) = stderr_pipe {
            let mut lines = BufReader::new(pipe).lines();
            while let Some(line) = lines.next_line().await? {
                on_stderr(&line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }
        Ok::<_, std::io::Error>(tail)
    };

    let (stdout, tail) = tokio::try_join!(read_stdout, forward_stderr)?;
    let status = child.wait().await?;

    if !status.success() {
        error!("Command failed with exit code {:?}", status.code());
        return Err(RunnerError::ExecutionFailed {
            command: rendered,
            exit_code: status.code(),
            stderr: Vec::from(tail).join("\n"),
        });
    }

    debug!("Command executed successfully: {} bytes of output", stdout.len());
    Ok(stdout)
}

fn build_command<S: AsRef<str>>(program: &Path, args: &[S], options: &ProcessOptions) -> Command {
    let mut cmd = Command::new(program);
    for arg in args {
        let arg: &str = arg.as_ref();
        cmd.arg(arg);
    }
    if let Some(ref dir) = options.cwd {
        cmd.current_dir(dir);
    }
    for key in &options.env_remove {
        cmd.env_remove(key);
    }
    for (key, value) in &options.envs {
        cmd.env(key, value);
    }
    cmd
}

/// Render a command line for logs, masking values of secret flags
pub fn display_command<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut parts = vec![program.to_string()];
    let mut mask_next = false;

    for arg in args {
        let arg: &str = arg.as_ref();
        if mask_next {
            parts.push("*****".to_string());
            mask_next = false;
            continue;
        }
        match arg.split_once('=') {
            Some((flag, _)) if SECRET_FLAGS.contains(&flag) => {
                parts.push(format!("{}=*****", flag));
            }
            _ => {
                mask_next = SECRET_FLAGS.contains(&arg);
                parts.push(arg.to_string());
            }
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command_masks_api_key() {
        let rendered = display_command(
            "ansible-galaxy",
            &["collection", "publish", "--api-key", "abc123", "x.tar.gz"],
        );
        assert_eq!(
            rendered,
            "ansible-galaxy collection publish --api-key ***** x.tar.gz"
        );
    }

    #[test]
    fn test_display_command_masks_inline_value() {
        let rendered = display_command("tool", &["--token=abc123"]);
        assert_eq!(rendered, "tool --token=*****");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_stdout() {
        let output = run("sh", &["-c", "echo hello"], &ProcessOptions::captured())
            .await
            .unwrap();
        assert_eq!(output.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_exit_code() {
        let err = run("sh", &["-c", "echo boom >&2; exit 3"], &ProcessOptions::captured())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
        assert!(err.to_string().contains("boom"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_applies_environment() {
        let options = ProcessOptions::captured()
            .env("GALAXY_RUNNER_TEST_VALUE", "set")
            .env_remove("GALAXY_RUNNER_TEST_UNSET");
        let output = run("sh", &["-c", "printf %s \"$GALAXY_RUNNER_TEST_VALUE\""], &options)
            .await
            .unwrap();
        assert_eq!(output, "set");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_forwarding_stderr_streams_lines() {
        let mut seen = Vec::new();
        let output = run_forwarding_stderr(
            "sh",
            &["-c", "echo one >&2; echo result; echo two >&2"],
            &ProcessOptions::captured(),
            |line| seen.push(line.to_string()),
        )
        .await
        .unwrap();

        assert_eq!(output.trim(), "result");
        assert_eq!(seen, vec!["one", "two"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_forwarding_stderr_keeps_tail_on_failure() {
        let err = run_forwarding_stderr(
            "sh",
            &["-c", "for i in $(seq 1 30); do echo line$i >&2; done; exit 2"],
            &ProcessOptions::captured(),
            |_| {},
        )
        .await
        .unwrap_err();

        match err {
            RunnerError::ExecutionFailed { exit_code, stderr, .. } => {
                assert_eq!(exit_code, Some(2));
                assert!(stderr.starts_with("line11\n"));
                assert!(stderr.ends_with("line30"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let err = run(
            "galaxy-runner-no-such-program",
            &[] as &[&str],
            &ProcessOptions::streaming(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RunnerError::ExecutionFailed { exit_code: None, .. }));
    }
}
