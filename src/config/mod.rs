use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::core::utils::{app_data_dir, cache_dir_in, config_file_in, ensure_dir, write_atomic};
use crate::errors::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub business_name: String,
    pub currency: String,
    /// PIN whose digest is seeded into documents that have none.
    pub default_pin: String,
    pub remote_file_name: String,
    /// Upper bound on waiting for the remote client before falling back to the cache.
    pub init_timeout_ms: u64,
    pub reminder_lookback_days: u32,
    pub recent_entries_limit: usize,
    pub drive_api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            business_name: "My Shop".into(),
            currency: "INR".into(),
            default_pin: "2807".into(),
            remote_file_name: "expenses_data.json".into(),
            init_timeout_ms: 15_000,
            reminder_lookback_days: 7,
            recent_entries_limit: 10,
            drive_api_base: "https://www.googleapis.com".into(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, LedgerError> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, LedgerError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
            base,
        })
    }

    pub fn load(&self) -> Result<Config, LedgerError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the local cache lives: `data_dir` when configured, else `<base>/cache`.
    pub fn cache_dir(&self, config: &Config) -> PathBuf {
        config
            .data_dir
            .clone()
            .unwrap_or_else(|| cache_dir_in(&self.base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.init_timeout(), Duration::from_secs(15));
        assert_eq!(manager.cache_dir(&config), dir.path().join("cache"));
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = Config {
            business_name: "Corner Print".into(),
            reminder_lookback_days: 14,
            data_dir: Some(dir.path().join("elsewhere")),
            ..Config::default()
        };
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
        assert_eq!(manager.cache_dir(&config), dir.path().join("elsewhere"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{ "currency": "EUR" }"#).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.default_pin, "2807");
    }
}
