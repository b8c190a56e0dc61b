//! Configuration management
//!
//! Settings come from an optional `pipeconv.yaml`, then environment
//! overrides. Every field has a default so an absent file is not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File looked up in the working directory when no path is given.
pub const FILE_NAME: &str = "pipeconv.yaml";

/// Environment variable overriding [`Config::log_level`].
pub const LOG_LEVEL_ENV: &str = "PIPECONV_LOG_LEVEL";

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration YAML
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_yaml::Error,
    },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Runner assigned to parsed jobs that do not name one
    pub default_runner: String,
    /// Branch used for the implicit push trigger of GitLab pipelines
    pub default_branch: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            default_runner: "ubuntu-latest".to_string(),
            default_branch: "main".to_string(),
        }
    }
}

impl Config {
    /// Parses configuration YAML. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the decoder error for malformed YAML.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Loads the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Loads `path` when given, otherwise [`FILE_NAME`] if it exists,
    /// otherwise the defaults; environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicit or discovered file is invalid.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None if Path::new(FILE_NAME).is_file() => Self::load(Path::new(FILE_NAME))?,
            None => Self::default(),
        };
        Ok(config.with_overrides(|name| std::env::var(name).ok()))
    }

    /// Applies environment overrides read through `lookup`.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|level| !level.trim().is_empty()) {
            self.log_level = level;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_runner, "ubuntu-latest");
        assert_eq!(config.default_branch, "main");
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("default_branch: trunk\n").unwrap();
        assert_eq!(config.default_branch, "trunk");
        assert_eq!(config.default_runner, "ubuntu-latest");
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_env_override() {
        let config = Config::default().with_overrides(|name| {
            (name == LOG_LEVEL_ENV).then(|| "debug".to_string())
        });
        assert_eq!(config.log_level, "debug");

        let unchanged = Config::default().with_overrides(|_| Some("  ".to_string()));
        assert_eq!(unchanged.log_level, "warn");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_runner: self-hosted").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.default_runner, "self-hosted");
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load(Path::new("/nonexistent/pipeconv.yaml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_runner: [unclosed").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse { .. })));
    }
}
