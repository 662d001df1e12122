//! Client configuration, read from a TOML file.
//!
//! Every field has a default, so an empty (or missing) file is a valid
//! configuration:
//!
//! ```toml
//! region = "ru"
//! language = "en"
//! color_mode = "light"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{CatalogError, Result};

const APP_DIR: &str = "stalcraft-catalog";

pub const DEFAULT_DATABASE_URL: &str =
    "https://raw.githubusercontent.com/EXBO-Studio/stalcraft-database/main";
pub const DEFAULT_REPO_API_URL: &str = "https://api.github.com/repos/EXBO-Studio/stalcraft-database";

/// How value colours from the database are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Use every colour as given.
    #[default]
    Dark,
    /// Keep only the positive/negative highlights; the rest are too pale.
    Light,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the raw database repository.
    pub database_url: String,
    /// GitHub API endpoint of the database repository.
    pub repo_api_url: String,
    /// Database region directory (`ru`, `global`, ...).
    pub region: String,
    /// Preferred language code for translated strings.
    pub language: String,
    pub color_mode: ColorMode,
    /// Cache file; defaults to `items.db` in the user data directory.
    pub database_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            repo_api_url: DEFAULT_REPO_API_URL.to_string(),
            region: "ru".to_string(),
            language: "ru".to_string(),
            color_mode: ColorMode::Dark,
            database_path: None,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used when present and the built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml(&text).map_err(|e| CatalogError::Config {
            message: format!("{}: {e}", path.display()),
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// `$XDG_CONFIG_HOME/stalcraft-catalog/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Base URL of the region's documents, e.g. `.../main/ru`.
    pub fn region_url(&self) -> String {
        format!(
            "{}/{}",
            self.database_url.trim_end_matches('/'),
            self.region.trim_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolved cache file path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("items.db")),
        }
    }
}

/// Per-user data directory of the application (cache and log files).
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| CatalogError::Config {
            message: "no user data directory available".into(),
        })
}
