// file: src/config/mod.rs
// version: 1.0.0
// guid: bba3a411-3d19-48fe-9a88-55feb70ed3c7

//! Project configuration for galaxy-runner
//!
//! Paths, collection identity and the Ansible version matrix. Every value has a
//! default so a bare checkout works without a config file.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the project root
pub const DEFAULT_CONFIG_FILE: &str = "galaxy-runner.yaml";

/// Settings describing the collection and where the runner keeps its state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Collection namespace (e.g. "delinea")
    pub namespace: String,
    /// Collection name within the namespace (e.g. "core")
    pub name: String,
    /// Directory holding one virtual environment per Ansible version
    pub venv_dir: PathBuf,
    /// Name of the venv used for tooling such as antsibull-changelog
    pub tooling_venv: String,
    /// Directory for build artifacts, ignored by git
    pub artifact_dir: PathBuf,
    /// Directory for user created changelog fragments
    pub fragments_dir: PathBuf,
    /// Collection manifest holding the `version` field
    pub manifest: PathBuf,
    /// Ansible versions to create virtual environments for
    pub ansible_versions: Vec<String>,
    /// Ansible version used for CI, building and publishing
    pub ci_version: String,
    /// Download URL template; `{version}` is replaced with the Ansible version
    pub ansible_download_url: String,
    /// Sanity tests skipped when running inside the venvs
    pub sanity_skip_tests: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            namespace: "delinea".to_string(),
            name: "core".to_string(),
            venv_dir: PathBuf::from(".cache"),
            tooling_venv: "tooling".to_string(),
            artifact_dir: PathBuf::from(".artifacts"),
            fragments_dir: PathBuf::from("changelogs/fragments"),
            manifest: PathBuf::from("galaxy.yml"),
            ansible_versions: vec![
                "stable-2.10".to_string(),
                "stable-2.11".to_string(),
                "stable-2.12".to_string(),
                "stable-2.13".to_string(),
                "devel".to_string(),
            ],
            ci_version: "stable-2.13".to_string(),
            ansible_download_url: "https://github.com/ansible/ansible/archive/{version}.tar.gz"
                .to_string(),
            sanity_skip_tests: vec!["symlinks".to_string(), "shebang".to_string()],
        }
    }
}

impl ProjectConfig {
    /// Fully qualified collection name, e.g. `delinea.core`
    pub fn collection_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Glob matching the tarball produced by `ansible-galaxy collection build`
    pub fn archive_pattern(&self) -> String {
        format!("{}-{}*.tar.gz", self.namespace, self.name)
    }

    /// Path of the virtual environment for an Ansible version
    pub fn venv_path(&self, version: &str) -> PathBuf {
        self.venv_dir.join(version)
    }

    /// Path of the tooling virtual environment
    pub fn tooling_venv_path(&self) -> PathBuf {
        self.venv_dir.join(&self.tooling_venv)
    }

    /// pip-installable URL for an Ansible version
    pub fn download_url(&self, version: &str) -> String {
        self.ansible_download_url.replace("{version}", version)
    }

    /// Where `ansible-galaxy collection install` places this collection
    pub fn installed_collection_dir(&self, home: &Path) -> PathBuf {
        home.join(".ansible")
            .join("collections")
            .join("ansible_collections")
            .join(&self.namespace)
            .join(&self.name)
    }

    /// Resolve all relative paths against a project root
    pub fn rooted_at(mut self, root: &Path) -> Self {
        for path in [
            &mut self.venv_dir,
            &mut self.artifact_dir,
            &mut self.fragments_dir,
            &mut self.manifest,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.namespace.trim().is_empty() || self.name.trim().is_empty() {
            return Err(crate::error::RunnerError::validation(
                "Collection namespace and name must not be empty",
            ));
        }

        if self.ansible_versions.is_empty() {
            return Err(crate::error::RunnerError::validation(
                "At least one Ansible version must be configured",
            ));
        }

        if !self.ansible_download_url.contains("{version}") {
            return Err(crate::error::RunnerError::validation(format!(
                "Download URL must contain a {{version}} placeholder: {}",
                self.ansible_download_url
            )));
        }

        if self.tooling_venv.is_empty() || self.ansible_versions.contains(&self.tooling_venv) {
            return Err(crate::error::RunnerError::validation(format!(
                "Tooling venv name {:?} must be non-empty and distinct from Ansible versions",
                self.tooling_venv
            )));
        }

        Ok(())
    }
}
