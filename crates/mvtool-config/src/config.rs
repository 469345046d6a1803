//! Configuration types and loading.
//!
//! [`MvtoolConfig`] mirrors `.mvtool/config.yaml`. [`load_config`] layers
//! built-in defaults, the YAML file and `MVTOOL_*` environment variables,
//! in that order. Nested keys are separated by `__` in the environment, so
//! `MVTOOL_JIRA__TOKEN` sets `jira.token`.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the configuration file inside `.mvtool/`.
pub const CONFIG_FILE: &str = "config.yaml";

const ENV_PREFIX: &str = "MVTOOL_";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Merging or extracting the configuration layers failed.
    #[error("invalid configuration: {0}")]
    Figment(#[from] figment::Error),

    #[error("no .mvtool directory found (run 'mvt init' first)")]
    DirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file, relative to the `.mvtool/` directory unless absolute.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("mvtool.db")
}

/// Jira connection. Without this section mvtool runs offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraConfig {
    pub url: String,
    /// Enables basic auth; otherwise the token is sent as a bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Imports only touch the fields present in a record unless disabled.
    #[serde(default = "default_true")]
    pub patch: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { patch: true }
    }
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The full configuration, corresponding to `.mvtool/config.yaml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MvtoolConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraConfig>,

    #[serde(default)]
    pub import: ImportConfig,
}

impl MvtoolConfig {
    /// Resolves the database path against the `.mvtool/` directory.
    pub fn database_path(&self, mvtool_dir: &Path) -> PathBuf {
        if self.database.path.is_absolute() {
            self.database.path.clone()
        } else {
            mvtool_dir.join(&self.database.path)
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Layers defaults, `config.yaml` in `mvtool_dir` and the environment.
///
/// A missing or empty file contributes nothing.
pub fn figment(mvtool_dir: &Path) -> Figment {
    Figment::from(Serialized::defaults(MvtoolConfig::default()))
        .merge(Yaml::file(mvtool_dir.join(CONFIG_FILE)))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Loads the configuration for the given `.mvtool/` directory.
pub fn load_config(mvtool_dir: &Path) -> Result<MvtoolConfig> {
    Ok(figment(mvtool_dir).extract()?)
}

/// Writes `config` to `config.yaml`, creating the directory if needed.
pub fn save_config(mvtool_dir: &Path, config: &MvtoolConfig) -> Result<()> {
    std::fs::create_dir_all(mvtool_dir)?;
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(mvtool_dir.join(CONFIG_FILE), yaml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(dir.path()).unwrap();
        assert_eq!(cfg.database.path, PathBuf::from("mvtool.db"));
        assert!(cfg.import.patch);
        assert!(cfg.jira.is_none());
    }

    #[test]
    fn partial_jira_section_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "jira:\n  url: https://jira.example.com\n  token: t0k\nimport:\n  patch: false\n",
        )
        .unwrap();

        let cfg = load_config(dir.path()).unwrap();
        let jira = cfg.jira.unwrap();
        assert_eq!(jira.url, "https://jira.example.com");
        assert_eq!(jira.username, None);
        assert!(jira.verify_ssl);
        assert_eq!(jira.timeout_secs, 30);
        assert!(!cfg.import.patch);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mvtool_dir = dir.path().join(".mvtool");
        let cfg = MvtoolConfig {
            database: DatabaseConfig {
                path: PathBuf::from("other.db"),
            },
            jira: Some(JiraConfig {
                url: "https://jira.example.com".into(),
                username: Some("alice".into()),
                token: "secret".into(),
                verify_ssl: false,
                timeout_secs: 5,
            }),
            import: ImportConfig::default(),
        };
        save_config(&mvtool_dir, &cfg).unwrap();
        assert_eq!(load_config(&mvtool_dir).unwrap(), cfg);
    }

    #[test]
    fn relative_database_path_resolves_inside_dir() {
        let cfg = MvtoolConfig::default();
        assert_eq!(
            cfg.database_path(Path::new("/work/.mvtool")),
            PathBuf::from("/work/.mvtool/mvtool.db")
        );
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "database: [unclosed\n").unwrap();
        assert!(matches!(
            load_config(dir.path()),
            Err(ConfigError::Figment(_))
        ));
    }
}
