// file: src/config/loader.rs
// version: 1.0.0
// guid: 919e275f-4d27-4795-928d-319e2ae3b9d6

//! Configuration file loading and environment variable substitution

use super::{ProjectConfig, DEFAULT_CONFIG_FILE};
use crate::error::RunnerError;
use crate::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Load the project config for `root`.
    ///
    /// An explicit path must exist. Without one, `galaxy-runner.yaml` in the
    /// project root is used when present, otherwise the defaults apply.
    pub fn load_project(&self, root: &Path, explicit: Option<&Path>) -> Result<ProjectConfig> {
        let config = match explicit {
            Some(path) => self.load_file(path)?,
            None => {
                let candidate = root.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    self.load_file(&candidate)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    ProjectConfig::default()
                }
            }
        };

        let config = config.rooted_at(root);
        config.validate()?;
        Ok(config)
    }

    /// Load a config file; `.toml` files are parsed as TOML, anything else as YAML
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<ProjectConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RunnerError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let expanded = self.expand_env_vars(&content)?;
        let mut config: ProjectConfig = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&expanded).map_err(|e| {
                RunnerError::config(format!("Invalid TOML in {}: {}", path.display(), e))
            })?
        } else {
            serde_yaml::from_str(&expanded)?
        };

        for dir in [
            &mut config.venv_dir,
            &mut config.artifact_dir,
            &mut config.fragments_dir,
            &mut config.manifest,
        ] {
            *dir = expand_tilde(dir);
        }

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Expand environment variables in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| RunnerError::config(format!("Invalid regex pattern: {}", e)))?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else if !missing_vars.iter().any(|v| v == var_name) {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(RunnerError::config(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) if s.starts_with('~') => PathBuf::from(shellexpand::tilde(s).into_owned()),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::new()
            .load_project(temp_dir.path(), None)
            .unwrap();
        assert_eq!(config.namespace, "delinea");
        assert_eq!(config.artifact_dir, temp_dir.path().join(".artifacts"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigLoader::new()
            .load_project(temp_dir.path(), Some(&temp_dir.path().join("nope.yaml")));
        assert!(matches!(result, Err(RunnerError::Config(_))));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(DEFAULT_CONFIG_FILE),
            "namespace: acme\nansible_versions:\n  - stable-2.15\n  - devel\nci_version: stable-2.15\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .load_project(temp_dir.path(), None)
            .unwrap();
        assert_eq!(config.collection_name(), "acme.core");
        assert_eq!(config.ansible_versions, vec!["stable-2.15", "devel"]);
        assert_eq!(config.tooling_venv, "tooling");
    }

    #[test]
    fn test_toml_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("runner.toml");
        fs::write(&path, "name = \"utils\"\nartifact_dir = \"dist\"\n").unwrap();

        let config = ConfigLoader::new()
            .load_project(temp_dir.path(), Some(&path))
            .unwrap();
        assert_eq!(config.collection_name(), "delinea.utils");
        assert_eq!(config.artifact_dir, temp_dir.path().join("dist"));
    }

    #[test]
    fn test_environment_variable_substitution() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("runner.yaml");
        fs::write(&path, "namespace: \"${TEST_RUNNER_NAMESPACE}\"\n").unwrap();

        let mut loader = ConfigLoader::new();
        loader.set_env_var("TEST_RUNNER_NAMESPACE".to_string(), "acme".to_string());
        let config = loader.load_file(&path).unwrap();
        assert_eq!(config.namespace, "acme");
    }

    #[test]
    fn test_missing_environment_variable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("runner.yaml");
        fs::write(&path, "namespace: \"${GALAXY_RUNNER_MISSING_VARIABLE}\"\n").unwrap();

        let err = ConfigLoader::new().load_file(&path).unwrap_err();
        assert!(err.to_string().contains("Missing environment variables"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(DEFAULT_CONFIG_FILE),
            "ansible_versions: []\n",
        )
        .unwrap();

        let result = ConfigLoader::new().load_project(temp_dir.path(), None);
        assert!(matches!(result, Err(RunnerError::Validation(_))));
    }
}
