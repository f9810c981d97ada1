// file: src/utils/system.rs
// version: 1.0.0
// guid: e3d8e7d9-4322-4988-9b51-81e88f118d0d

//! System utility functions

use crate::error::RunnerError;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Mode for directories the runner creates (rwxr-xr-x)
pub const DIR_PERMISSIONS: u32 = 0o755;

/// System utility functions
pub struct SystemUtils;

impl SystemUtils {
    /// Check if a command exists in PATH
    pub fn command_exists(command: &str) -> bool {
        which::which(command).is_ok()
    }

    /// Fail on platforms where venv layout and PATH handling are not supported
    pub fn ensure_unix() -> Result<()> {
        if cfg!(windows) {
            return Err(RunnerError::UnsupportedPlatform(
                std::env::consts::OS.to_string(),
            ));
        }
        Ok(())
    }

    /// Interpret a `CI` variable value; empty, `0` and `false` mean not CI
    pub fn is_ci_value(value: Option<&str>) -> bool {
        match value {
            Some(v) => !v.is_empty() && !v.eq_ignore_ascii_case("false") && v != "0",
            None => false,
        }
    }

    /// The user's home directory
    pub fn home_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .ok_or_else(|| RunnerError::config("Unable to determine the home directory"))
    }

    /// Create a directory (and parents) with the runner's default permissions.
    /// An existing directory is not an error.
    pub fn create_dir(path: &Path) -> Result<()> {
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(DIR_PERMISSIONS);
        }
        builder.create(path)?;
        debug!("Ensured directory: {}", path.display());
        Ok(())
    }

    /// Create each directory, logging failures instead of aborting
    pub fn create_dirs_lenient(paths: &[&Path]) {
        for path in paths {
            if let Err(e) = Self::create_dir(path) {
                error!("failed to create {} directory: {}", path.display(), e);
            }
        }
    }

    /// Remove a directory tree; a missing directory is not an error
    pub fn remove_dir(path: &Path) -> Result<()> {
        match std::fs::remove_dir_all(path) {
            Ok(()) => {
                debug!("Removed directory: {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_command_exists() {
        #[cfg(unix)]
        assert!(SystemUtils::command_exists("sh"));
        assert!(!SystemUtils::command_exists("nonexistent-command-12345"));
    }

    #[test]
    fn test_is_ci_value() {
        assert!(SystemUtils::is_ci_value(Some("true")));
        assert!(SystemUtils::is_ci_value(Some("1")));
        assert!(!SystemUtils::is_ci_value(Some("false")));
        assert!(!SystemUtils::is_ci_value(Some("0")));
        assert!(!SystemUtils::is_ci_value(Some("")));
        assert!(!SystemUtils::is_ci_value(None));
    }

    #[test]
    fn test_create_and_remove_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a/b");

        SystemUtils::create_dir(&nested).unwrap();
        SystemUtils::create_dir(&nested).unwrap();
        assert!(nested.is_dir());

        SystemUtils::remove_dir(&temp_dir.path().join("a")).unwrap();
        assert!(!nested.exists());
        SystemUtils::remove_dir(&temp_dir.path().join("a")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_create_dir_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("artifacts");
        SystemUtils::create_dir(&dir).unwrap();

        let mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        // umask may only clear bits
        assert_eq!(mode & !DIR_PERMISSIONS, 0);
    }
}
