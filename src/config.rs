use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::file::{BLOCK_SIZE, BUFFER_POOL_SIZE, LOG_FILE, MAX_BLOCK_SIZE};
use crate::log::{HEADER_SIZE, TRAILER_SIZE};

const CONFIG_FILE: &str = "storage.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Block size {size} cannot hold a log record (minimum {minimum})")]
    BlockTooSmall { size: usize, minimum: usize },

    #[error("Block size {size} exceeds the maximum of {maximum}")]
    BlockTooLarge { size: usize, maximum: usize },

    #[error("Buffer pool needs at least one buffer")]
    EmptyPool,

    #[error("Log file name is empty")]
    EmptyLogFile,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Storage parameters of one database directory, kept in `storage.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub block_size: usize,
    pub pool_size: usize,
    pub log_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            block_size: BLOCK_SIZE,
            pool_size: BUFFER_POOL_SIZE,
            log_file: LOG_FILE.to_string(),
        }
    }
}

impl StorageConfig {
    /// Smallest block that still fits the log header and an empty record
    pub const MIN_BLOCK_SIZE: usize = HEADER_SIZE + TRAILER_SIZE;

    pub fn load(db_path: &Path) -> ConfigResult<Self> {
        let config_path = db_path.join(CONFIG_FILE);
        let content = fs::read_to_string(&config_path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, db_path: &Path) -> ConfigResult<()> {
        self.validate()?;
        let config_path = db_path.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(&self)?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Load the saved configuration, falling back to the defaults when the
    /// directory has none yet
    pub fn load_or_default(db_path: &Path) -> ConfigResult<Self> {
        if Self::exists(db_path) {
            Self::load(db_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn exists(db_path: &Path) -> bool {
        db_path.join(CONFIG_FILE).is_file()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.block_size < Self::MIN_BLOCK_SIZE {
            return Err(ConfigError::BlockTooSmall {
                size: self.block_size,
                minimum: Self::MIN_BLOCK_SIZE,
            });
        }
        if self.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::BlockTooLarge {
                size: self.block_size,
                maximum: MAX_BLOCK_SIZE,
            });
        }
        if self.pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if self.log_file.is_empty() {
            return Err(ConfigError::EmptyLogFile);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.block_size, BLOCK_SIZE);
        assert_eq!(config.pool_size, BUFFER_POOL_SIZE);
        assert_eq!(config.log_file, LOG_FILE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig {
            block_size: 400,
            pool_size: 3,
            log_file: "wal.log".to_string(),
        };
        config.save(temp_dir.path()).unwrap();
        assert!(StorageConfig::exists(temp_dir.path()));

        let loaded = StorageConfig::load(temp_dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::load_or_default(temp_dir.path()).unwrap();
        assert_eq!(config, StorageConfig::default());
        assert!(matches!(
            StorageConfig::load(temp_dir.path()),
            Err(ConfigError::IoError(_))
        ));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE), r#"{ "pool_size": 2 }"#).unwrap();

        let config = StorageConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.block_size, BLOCK_SIZE);
        assert_eq!(config.log_file, LOG_FILE);
    }

    #[test]
    fn test_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE), "not json").unwrap();
        assert!(matches!(
            StorageConfig::load(temp_dir.path()),
            Err(ConfigError::JsonError(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = StorageConfig {
            block_size: 15,
            ..StorageConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BlockTooSmall {
                size: 15,
                minimum: 16
            })
        ));

        config.block_size = MAX_BLOCK_SIZE + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BlockTooLarge { .. })
        ));

        config.block_size = 16;
        assert!(config.validate().is_ok());

        config.pool_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::EmptyPool)));

        config.pool_size = 1;
        config.log_file.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyLogFile)));
    }

    #[test]
    fn test_save_rejects_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig {
            pool_size: 0,
            ..StorageConfig::default()
        };
        assert!(config.save(temp_dir.path()).is_err());
        assert!(!StorageConfig::exists(temp_dir.path()));
    }
}
