use std::path::{Path, PathBuf};

use animelog_api::SortMode;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::AnimelogError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Environment variable that overrides `[mal] client_id`.
pub const CLIENT_ID_ENV: &str = "MAL_CLIENT_ID";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub vault: VaultConfig,
    pub notes: NotesConfig,
    pub mal: MalConfig,
    pub jikan: JikanConfig,
    pub browse: BrowseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    pub root: PathBuf,
    pub notes_dir: String,
    pub attachments_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesConfig {
    pub base_tag: String,
    pub block_language: String,
    pub locale: Locale,
    pub thumbnail_width: u32,
}

/// Language for period labels and grid headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ja,
    En,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MalConfig {
    pub client_id: String,
    pub base_url: String,
    pub page_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JikanConfig {
    pub enabled: bool,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    pub default_sort: SortMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    pub file: bool,
}

impl AppConfig {
    /// Load config from the user file if it exists, else the built-in defaults.
    pub fn load() -> Result<Self, AnimelogError> {
        let path = Self::config_path();
        if path.exists() {
            return Self::load_from(&path);
        }
        let mut config: Self =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| AnimelogError::Config(e.to_string()))?;
        config.apply_env();
        Ok(config)
    }

    /// Load config from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, AnimelogError> {
        let user_str = std::fs::read_to_string(path)
            .map_err(|e| AnimelogError::Config(format!("{}: {e}", path.display())))?;
        let mut config: Self =
            toml::from_str(&user_str).map_err(|e| AnimelogError::Config(e.to_string()))?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(id) = std::env::var(CLIENT_ID_ENV) {
            if !id.trim().is_empty() {
                self.mal.client_id = id.trim().to_string();
            }
        }
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Directory for rolling log files.
    pub fn log_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "animelog")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.vault.notes_dir, "animelog");
        assert_eq!(config.vault.attachments_dir, "attachments/anime");
        assert_eq!(config.notes.base_tag, "animelog");
        assert_eq!(config.notes.block_language, "animeLog");
        assert_eq!(config.notes.locale, Locale::Ja);
        assert_eq!(config.mal.page_limit, 500);
        assert_eq!(config.browse.default_sort, SortMode::Popularity);
        assert!(config.jikan.enabled);
    }

    #[test]
    fn test_roundtrip() {
        let config = AppConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.notes.thumbnail_width, config.notes.thumbnail_width);
        assert_eq!(deserialized.notes.locale, config.notes.locale);
    }

    #[test]
    fn test_load_from_user_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.notes.locale = Locale::En;
        config.browse.default_sort = SortMode::Newest;
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.notes.locale, Locale::En);
        assert_eq!(loaded.browse.default_sort, SortMode::Newest);
    }

    #[test]
    fn test_load_from_missing_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("typo.toml");
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, AnimelogError::Config(ref msg) if msg.contains("typo.toml")));
    }

    #[test]
    fn test_load_from_invalid_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[vault\nroot = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(AnimelogError::Config(_))
        ));
    }
}
