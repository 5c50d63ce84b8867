//! Configuration management.
//!
//! Credentials and endpoints live in `~/.mochi-sync/config.json`:
//!
//! ```json
//! {
//!   "MOCHI_API_KEY": "...",
//!   "OPENROUTER_API_KEY": "...",
//!   "MOCHI_BASE_URL": "https://app.mochi.cards/api"
//! }
//! ```
//!
//! Environment variables of the same names take precedence over the file.
//! [`Config`] is resolved once at startup and passed down by reference.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::remote::DEFAULT_BASE_URL;

/// Per-user state directory name under the home directory.
const USER_DIR: &str = ".mochi-sync";
const CONFIG_FILE: &str = "config.json";

/// On-disk shape of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mochi_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openrouter_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mochi_base_url: Option<String>,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mochi_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub mochi_base_url: String,
    /// File the configuration was read from and API keys are saved to.
    pub path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mochi_api_key: None,
            openrouter_api_key: None,
            mochi_base_url: DEFAULT_BASE_URL.to_string(),
            path: None,
        }
    }
}

/// Default config file location: `~/.mochi-sync/config.json`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(USER_DIR).join(CONFIG_FILE))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    ///
    /// `explicit` replaces the default location. A missing file is not an
    /// error; an unreadable or malformed one is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but cannot be read or
    /// parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit.map(Path::to_path_buf).or_else(default_config_path);
        let file = match &path {
            Some(p) => read_config_file(p)?,
            None => ConfigFile::default(),
        };

        let mut config = Self::from_file(file, path);
        config.apply_env(|name| std::env::var(name).ok());
        debug!(
            path = ?config.path,
            mochi_key = config.mochi_api_key.is_some(),
            openrouter_key = config.openrouter_api_key.is_some(),
            base_url = %config.mochi_base_url,
            "Configuration resolved"
        );
        Ok(config)
    }

    fn from_file(file: ConfigFile, path: Option<PathBuf>) -> Self {
        Self {
            mochi_api_key: non_empty(file.mochi_api_key),
            openrouter_api_key: non_empty(file.openrouter_api_key),
            mochi_base_url: non_empty(file.mochi_base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            path,
        }
    }

    /// Override values from environment variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = non_empty(lookup("MOCHI_API_KEY")) {
            self.mochi_api_key = Some(key);
        }
        if let Some(key) = non_empty(lookup("OPENROUTER_API_KEY")) {
            self.openrouter_api_key = Some(key);
        }
        if let Some(url) = non_empty(lookup("MOCHI_BASE_URL")) {
            self.mochi_base_url = url;
        }
    }

    /// The OpenRouter key needed by `dedupe` and `curate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no key is configured.
    pub fn require_openrouter_key(&self) -> Result<&str> {
        self.openrouter_api_key.as_deref().ok_or_else(|| {
            Error::Config(
                "OpenRouter API key not configured: set OPENROUTER_API_KEY or add it to the config file"
                    .to_string(),
            )
        })
    }

    /// Store a Mochi API key in memory and in the config file, keeping the
    /// file's other entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if there is no config location or the file
    /// cannot be written.
    pub fn save_mochi_api_key(&mut self, key: &str) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| Error::Config("Could not determine home directory".into()))?;

        let mut file = read_config_file(&path)?;
        file.mochi_api_key = Some(key.to_string());
        write_config_file(&path, &file)?;

        self.mochi_api_key = Some(key.to_string());
        Ok(())
    }
}

/// Read a config file, treating a missing file as empty.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read or parsed.
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {}: {e}", path.display())))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file {}: {e}", path.display())))
}

/// Write a config file, creating its directory.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be written.
pub fn write_config_file(path: &Path, file: &ConfigFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
    }

    let content = serde_json::to_string_pretty(file)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

    fs::write(path, content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let file = read_config_file(&dir.path().join("config.json")).unwrap();
        assert_eq!(file, ConfigFile::default());

        let config = Config::from_file(file, None);
        assert_eq!(config.mochi_base_url, DEFAULT_BASE_URL);
        assert!(config.mochi_api_key.is_none());
    }

    #[test]
    fn test_file_keys_are_screaming_snake() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"MOCHI_API_KEY": "abc", "MOCHI_BASE_URL": "http://localhost:9"}"#).unwrap();

        let config = Config::from_file(read_config_file(&path).unwrap(), Some(path));
        assert_eq!(config.mochi_api_key.as_deref(), Some("abc"));
        assert_eq!(config.mochi_base_url, "http://localhost:9");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::from_file(
            ConfigFile {
                mochi_api_key: Some("from-file".into()),
                ..ConfigFile::default()
            },
            None,
        );
        config.apply_env(|name| match name {
            "MOCHI_API_KEY" => Some("from-env".to_string()),
            "OPENROUTER_API_KEY" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.mochi_api_key.as_deref(), Some("from-env"));
        assert!(config.openrouter_api_key.is_none());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "MOCHI_API_KEY=abc").unwrap();
        let err = read_config_file(&path).unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_save_key_preserves_other_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        write_config_file(
            &path,
            &ConfigFile {
                openrouter_api_key: Some("or-key".into()),
                ..ConfigFile::default()
            },
        )
        .unwrap();

        let mut config = Config::from_file(read_config_file(&path).unwrap(), Some(path.clone()));
        config.save_mochi_api_key("new-key").unwrap();

        let saved = read_config_file(&path).unwrap();
        assert_eq!(saved.mochi_api_key.as_deref(), Some("new-key"));
        assert_eq!(saved.openrouter_api_key.as_deref(), Some("or-key"));
        assert_eq!(config.mochi_api_key.as_deref(), Some("new-key"));
    }

    #[test]
    fn test_require_openrouter_key() {
        let config = Config::default();
        assert!(config.require_openrouter_key().is_err());
    }
}
