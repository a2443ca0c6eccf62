use crate::barcode::Platform;
use crate::error::{Error, Result};
use crate::history::MAX_HISTORY_ITEMS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub platform: Platform,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_settle_delay_ms() -> u64 {
    1000
}

impl ScannerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

fn default_max_items() -> usize {
    MAX_HISTORY_ITEMS
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Loads the user config, writing defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config =
                toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
            if config.history.max_items == 0 {
                return Err(Error::Config(
                    "history.max_items must be at least 1".to_string(),
                ));
            }
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("codescan")
            .join("config.toml")
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("codescan")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Sets one value by its `config set` key.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |e: String| Error::Config(format!("invalid value for {}: {}", key, e));
        match key {
            "platform" => self.scanner.platform = value.parse().map_err(invalid)?,
            "settle_delay_ms" => {
                self.scanner.settle_delay_ms = value.parse().map_err(|e| invalid(format!("{}", e)))?
            }
            "max_items" => {
                let max_items: usize = value.parse().map_err(|e| invalid(format!("{}", e)))?;
                if max_items == 0 {
                    return Err(invalid("must be at least 1".into()));
                }
                self.history.max_items = max_items;
            }
            "data_dir" => self.storage.data_dir = Some(PathBuf::from(value)),
            _ => {
                return Err(Error::Config(format!(
                    "unknown key: {} (available: platform, settle_delay_ms, max_items, data_dir)",
                    key
                )))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("codescan").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.history.max_items, 1000);
        assert_eq!(config.scanner.settle_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[scanner]\nplatform = \"ios\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.scanner.platform, Platform::Ios);
        assert_eq!(config.scanner.settle_delay_ms, 1000);
        assert_eq!(config.history.max_items, 1000);
        assert_eq!(config.storage.data_dir, None);
    }

    #[test]
    fn test_set_value_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.set_value("platform", "android").unwrap();
        config.set_value("max_items", "50").unwrap();
        config.set_value("data_dir", "/tmp/scans").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.scanner.platform, Platform::Android);
        assert_eq!(loaded.history.max_items, 50);
        assert_eq!(loaded.data_dir(), PathBuf::from("/tmp/scans"));
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = Config::default();
        assert!(config.set_value("platform", "windows").is_err());
        assert!(config.set_value("max_items", "0").is_err());
        assert!(config.set_value("max_items", "many").is_err());
        assert!(config.set_value("color", "red").is_err());
    }

    #[test]
    fn test_zero_max_items_in_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[history]\nmax_items = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[scanner\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
