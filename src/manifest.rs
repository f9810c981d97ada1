// file: src/manifest.rs
// version: 1.0.0
// guid: 2f7afdba-5f63-4e7d-b2d2-b9a00466d9d2

//! Collection manifest (`galaxy.yml`) access through `yq`

use crate::utils::process::{self, ProcessOptions};
use crate::Result;
use std::path::PathBuf;
use tracing::info;

/// Reads and writes the `version` field of the collection manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    yq: String,
}

impl Manifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            yq: "yq".to_string(),
        }
    }

    /// Use a specific `yq` binary
    pub fn with_yq(mut self, yq: impl Into<String>) -> Self {
        self.yq = yq.into();
        self
    }

    /// Arguments for reading the version
    pub fn read_args(&self) -> Vec<String> {
        vec![".version".to_string(), self.path.to_string_lossy().into_owned()]
    }

    /// Arguments for replacing the version in place
    pub fn write_args(&self, version: &str) -> Vec<String> {
        vec![
            "--inplace".to_string(),
            format!(".version = \"{}\"", version),
            self.path.to_string_lossy().into_owned(),
        ]
    }

    /// Current version, with yq's trailing newline and quotes removed
    pub async fn read_version(&self) -> Result<String> {
        let output = process::run(&self.yq, &self.read_args(), &ProcessOptions::captured()).await?;
        Ok(output.trim().trim_matches('"').to_string())
    }

    /// Replace the version field
    pub async fn write_version(&self, version: &str) -> Result<()> {
        let args = self.write_args(version);
        info!("command: {}", process::display_command(&self.yq, &args));
        process::run(&self.yq, &args, &ProcessOptions::streaming()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_args() {
        let manifest = Manifest::new("galaxy.yml");
        assert_eq!(manifest.read_args(), vec![".version", "galaxy.yml"]);
    }

    #[test]
    fn test_write_args() {
        let manifest = Manifest::new("/repo/galaxy.yml");
        assert_eq!(
            manifest.write_args("1.2.4"),
            vec!["--inplace", ".version = \"1.2.4\"", "/repo/galaxy.yml"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_read_version_strips_quotes() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let fake_yq = temp_dir.path().join("yq");
        std::fs::write(&fake_yq, "#!/bin/sh\necho '\"1.0.3\"'\n").unwrap();
        std::fs::set_permissions(&fake_yq, std::fs::Permissions::from_mode(0o755)).unwrap();

        let manifest = Manifest::new(temp_dir.path().join("galaxy.yml"))
            .with_yq(fake_yq.to_string_lossy());
        assert_eq!(manifest.read_version().await.unwrap(), "1.0.3");
    }
}
