//! Application configuration.
//!
//! Read from an optional `relay.toml` in the working directory, then from
//! `RELAY_*` environment variables (`RELAY_BACKEND=kv`,
//! `RELAY_TIMEOUT_MS=5000`, ...).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat, FileSourceFile};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE: &str = "relay";
const ENV_PREFIX: &str = "RELAY";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or a value had the wrong shape.
    #[error("invalid configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// `backend = "remote"` without a server address.
    #[error("the remote backend requires remote_url")]
    MissingRemoteUrl,
}

/// Which persistence backend the store talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One directory per workspace, one JSON file per request.
    #[default]
    Disk,
    /// Embedded sled database.
    Kv,
    /// A workbench server over HTTP.
    Remote,
}

/// Settings for one run of the binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Storage backend.
    #[serde(default)]
    pub backend: BackendKind,

    /// Where the disk and kv backends keep their data.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Base URL of the workbench server for the remote backend.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Timeout for outgoing HTTP requests, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Workspace to activate after hydration.
    #[serde(default)]
    pub workspace: Option<String>,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("relay")
}

const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            data_dir: default_data_dir(),
            remote_url: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            workspace: None,
        }
    }
}

impl AppConfig {
    /// Loads `relay.toml` (if present) and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(
            File::with_name(CONFIG_FILE).required(false),
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )
    }

    /// Loads from an explicit file and environment source.
    fn from_sources(
        file: File<FileSourceFile, FileFormat>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Loads from a specific file, still honouring the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_sources(
            File::from(path).required(true),
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )
    }

    /// The HTTP timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The remote server address, required by the remote backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRemoteUrl`] when unset or blank.
    pub fn remote_url(&self) -> Result<&str, ConfigError> {
        self.remote_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingRemoteUrl)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use config::Map;
    use pretty_assertions::assert_eq;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(map))
    }

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("relay.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_sources() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_sources(
            File::from(dir.path().join("absent.toml")).required(false),
            env(&[]),
        )
        .unwrap();

        assert_eq!(config.backend, BackendKind::Disk);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.data_dir.ends_with("relay"));
        assert_eq!(config.workspace, None);
    }

    #[test]
    fn test_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "backend = \"kv\"\ndata_dir = \"/srv/relay\"\ntimeout_ms = 1500\nworkspace = \"api\"\n",
        );

        let config = AppConfig::from_sources(File::from(path), env(&[])).unwrap();

        assert_eq!(config.backend, BackendKind::Kv);
        assert_eq!(config.data_dir, PathBuf::from("/srv/relay"));
        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.workspace.as_deref(), Some("api"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "backend = \"kv\"\ntimeout_ms = 1500\n");

        let config = AppConfig::from_sources(
            File::from(path),
            env(&[
                ("RELAY_BACKEND", "remote"),
                ("RELAY_REMOTE_URL", "http://localhost:3102"),
                ("RELAY_TIMEOUT_MS", "250"),
            ]),
        )
        .unwrap();

        assert_eq!(config.backend, BackendKind::Remote);
        assert_eq!(config.remote_url().unwrap(), "http://localhost:3102");
        assert_eq!(config.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "backend = \"postgres\"\n");

        let result = AppConfig::from_sources(File::from(path), env(&[]));

        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_remote_url_required() {
        let config = AppConfig {
            backend: BackendKind::Remote,
            remote_url: Some("  ".to_string()),
            ..AppConfig::default()
        };
        assert!(matches!(config.remote_url(), Err(ConfigError::MissingRemoteUrl)));
    }
}
