//! Configuration management with file persistence

use crate::application::services::{DEFAULT_CONFLICT_RETRIES, MAX_CONFLICT_RETRIES};
use crate::storage::{DatabaseConfig, default_database_path};
use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "PETSTORE_CONFIG_DIR";

/// Pet store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub service: ServiceSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// How many times a conflicting mutation is rerun before failing
    pub conflict_retries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: 5,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "petstore=info".to_string(),
        }
    }
}

const KEYS: [&str; 4] = [
    "database.path",
    "database.max_connections",
    "service.conflict_retries",
    "logging.filter",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("petstore")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            return Err(anyhow!("database.max_connections must be at least 1"));
        }
        if self.service.conflict_retries > MAX_CONFLICT_RETRIES {
            return Err(anyhow!(
                "service.conflict_retries must be {} or less",
                MAX_CONFLICT_RETRIES
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(anyhow!("logging.filter cannot be empty"));
        }
        Ok(())
    }

    /// Database settings in the form the storage layer takes
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::with_path(&self.database.path).max_connections(self.database.max_connections)
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.path" => Ok(self.database.path.display().to_string()),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),
            "service.conflict_retries" => Ok(self.service.conflict_retries.to_string()),
            "logging.filter" => Ok(self.logging.filter.clone()),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `petstore config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "database.path" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("database.path cannot be empty"));
                }
                self.database.path = PathBuf::from(value);
            }
            "database.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("database.max_connections must be at least 1"));
                }
                self.database.max_connections = max;
            }
            "service.conflict_retries" => {
                let retries: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid conflict_retries value: {}", value))?;
                if retries > MAX_CONFLICT_RETRIES {
                    return Err(anyhow!(
                        "service.conflict_retries must be {} or less",
                        MAX_CONFLICT_RETRIES
                    ));
                }
                self.service.conflict_retries = retries;
            }
            "logging.filter" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("logging.filter cannot be empty"));
                }
                self.logging.filter = value.to_string();
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `petstore config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults by removing the file at `path`
    pub fn reset_at(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        Self::reset_at(&Self::config_path()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.service.conflict_retries, 1);
        assert_eq!(config.logging.filter, "petstore=info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("database.path", "/tmp/pets.db").unwrap();
        config.set("service.conflict_retries", "3").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.database.path, PathBuf::from("/tmp/pets.db"));
        assert_eq!(loaded.service.conflict_retries, 3);

        Config::reset_at(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[service]\nconflict_retries = 0\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.service.conflict_retries, 0);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[service]\nconflict_retries = 9\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("conflict_retries"));
    }

    #[test]
    fn test_set_validation() {
        let mut config = Config::default();
        assert!(config.set("database.max_connections", "0").is_err());
        assert!(config.set("database.max_connections", "many").is_err());
        assert!(config.set("service.conflict_retries", "6").is_err());
        assert!(config.set("logging.filter", " ").is_err());
        assert!(config.set("store.name", "x").is_err());
    }

    #[test]
    fn test_list_covers_every_key() {
        let config = Config::default();
        let entries = config.list().unwrap();
        assert_eq!(entries.len(), KEYS.len());
        assert!(entries.iter().any(|(k, v)| k == "logging.filter" && v == "petstore=info"));
    }

    #[test]
    fn test_database_config() {
        let mut config = Config::default();
        config.set("database.max_connections", "8").unwrap();
        let db = config.database_config();
        assert_eq!(db.max_connections, 8);
        assert_eq!(db.path, config.database.path);
    }
}
