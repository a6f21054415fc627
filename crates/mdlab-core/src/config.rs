//! User configuration.
//!
//! Settings live in `<config_dir>/mdlab/config.toml`. Every key is optional;
//! `MDLAB_*` environment variables override whatever the file says.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding [`Config::base_path`].
pub const ENV_BASE_PATH: &str = "MDLAB_BASE_PATH";
/// Environment variable overriding [`Config::base_file`].
pub const ENV_BASE_FILE: &str = "MDLAB_BASE_FILE";
/// Environment variable overriding [`Config::temp_path`].
pub const ENV_TEMP_PATH: &str = "MDLAB_TEMP_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Notes directory, searched by `mdlab search`.
    pub base_path: PathBuf,

    /// Entry notebook created under `base_path` by `mdlab init`.
    pub base_file: String,

    /// Root of the shared temp workspace where programs are synthesized.
    pub temp_path: PathBuf,

    /// Python interpreter override. When unset `python3` then `python` are
    /// searched on PATH.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,

    /// Jai compiler override. When unset `jai` and the platform binary names
    /// are searched on PATH.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jai: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            base_path: home.join("mdl"),
            base_file: "index.md".to_string(),
            temp_path: std::env::temp_dir().join("mdl"),
            python: None,
            jai: None,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// tried and a missing file falls back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_path(path)?.ok_or_else(|| Error::Config {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            })?,
            None => match Self::config_path() {
                Some(path) => Self::load_from_path(&path)?.unwrap_or_default(),
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a config file, returning `None` when it does not exist.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.base_path = expand_tilde(&config.base_path);
        config.temp_path = expand_tilde(&config.temp_path);

        tracing::debug!("Loaded config from {}", path.display());
        Ok(Some(config))
    }

    /// Write the config as TOML, creating parent directories.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config file location.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mdlab").join("config.toml"))
    }

    /// Path of the entry notebook.
    pub fn base_file_path(&self) -> PathBuf {
        self.base_path.join(&self.base_file)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_BASE_PATH).filter(|v| !v.is_empty()) {
            self.base_path = expand_tilde(Path::new(&value));
        }
        if let Some(value) = lookup(ENV_BASE_FILE).filter(|v| !v.is_empty()) {
            self.base_file = value;
        }
        if let Some(value) = lookup(ENV_TEMP_PATH).filter(|v| !v.is_empty()) {
            self.temp_path = expand_tilde(Path::new(&value));
        }
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.base_path.ends_with("mdl"));
        assert_eq!(config.base_file, "index.md");
        assert!(config.temp_path.ends_with("mdl"));
        assert_eq!(config.python, None);
        assert_eq!(config.jai, None);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "temp_path = \"/tmp/elsewhere\"\npython = \"python3.12\"\n")
            .expect("write config");

        let config = Config::load_from_path(&path)
            .expect("load")
            .expect("config present");

        assert_eq!(config.temp_path, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(config.python.as_deref(), Some("python3.12"));
        assert_eq!(config.base_file, "index.md");
    }

    #[test]
    fn test_missing_file_is_none() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let result = Config::load_from_path(temp.path().join("nope.toml")).expect("load");
        assert!(result.is_none());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let err = Config::load(Some(&temp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "base_file = [").expect("write config");

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("nested").join("config.toml");
        let config = Config {
            base_path: PathBuf::from("/notes"),
            base_file: "home.md".to_string(),
            temp_path: PathBuf::from("/scratch"),
            python: None,
            jai: Some("/opt/jai/bin/jai-linux".to_string()),
        };

        config.save_to_path(&path).expect("save");
        let loaded = Config::load_from_path(&path).expect("load").expect("present");
        assert_eq!(loaded, config);
        assert_eq!(loaded.base_file_path(), PathBuf::from("/notes/home.md"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_FILE, "start.md"),
            (ENV_TEMP_PATH, "/var/tmp/mdl"),
            (ENV_BASE_PATH, ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        let base_path = config.base_path.clone();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_file, "start.md");
        assert_eq!(config.temp_path, PathBuf::from("/var/tmp/mdl"));
        assert_eq!(config.base_path, base_path, "empty override is ignored");
    }
}
