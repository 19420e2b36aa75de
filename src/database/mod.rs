use log::info;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::buffer::{BufferError, BufferPoolManager};
use crate::config::{ConfigError, StorageConfig};
use crate::file::{FileError, FileManager};
use crate::log::{LogError, LogManager};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("File error: {0}")]
    FileError(#[from] FileError),

    #[error("Log error: {0}")]
    LogError(#[from] LogError),

    #[error("Buffer error: {0}")]
    BufferError(#[from] BufferError),

    #[error("Database was created with block size {stored}, requested {requested}")]
    BlockSizeMismatch { stored: usize, requested: usize },
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// One database directory with its file manager, log and buffer pool wired
/// together
///
/// The buffer pool holds the log manager so dirty pages are never written
/// before their log records. Dropping the database drops the log manager
/// last, which writes out the tail block of the log.
pub struct Database {
    config: StorageConfig,
    buffer_pool: BufferPoolManager,
    log_manager: Arc<LogManager>,
    file_manager: Arc<FileManager>,
}

impl Database {
    /// Open `db_path` with its saved configuration, creating the directory
    /// with the default one if needed
    pub fn open<P: AsRef<Path>>(db_path: P) -> DatabaseResult<Self> {
        let config = StorageConfig::load_or_default(db_path.as_ref())?;
        Self::open_with_config(db_path, config)
    }

    /// Open `db_path` with an explicit configuration. An existing directory
    /// keeps its block size; the pool size and log file may change between
    /// runs.
    pub fn open_with_config<P: AsRef<Path>>(
        db_path: P,
        config: StorageConfig,
    ) -> DatabaseResult<Self> {
        let db_path = db_path.as_ref();
        config.validate()?;

        let existing = StorageConfig::exists(db_path);
        if existing {
            let stored = StorageConfig::load(db_path)?;
            if stored.block_size != config.block_size {
                return Err(DatabaseError::BlockSizeMismatch {
                    stored: stored.block_size,
                    requested: config.block_size,
                });
            }
        }

        let file_manager = Arc::new(FileManager::with_block_size(db_path, config.block_size)?);
        config.save(db_path)?;

        let log_manager = Arc::new(LogManager::new(
            Arc::clone(&file_manager),
            &config.log_file,
        )?);
        let buffer_pool = BufferPoolManager::new(
            Arc::clone(&file_manager),
            Arc::clone(&log_manager),
            config.pool_size,
        );

        info!(
            "Opened {} database at {} (block size {}, {} buffers)",
            if existing { "existing" } else { "new" },
            db_path.display(),
            config.block_size,
            config.pool_size
        );

        Ok(Self {
            config,
            buffer_pool,
            log_manager,
            file_manager,
        })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn file_manager(&self) -> &Arc<FileManager> {
        &self.file_manager
    }

    pub fn log_manager(&self) -> &Arc<LogManager> {
        &self.log_manager
    }

    pub fn buffer_pool(&self) -> &BufferPoolManager {
        &self.buffer_pool
    }

    /// Number of blocks in the log file
    pub fn log_size(&self) -> DatabaseResult<usize> {
        Ok(self.file_manager.size(&self.config.log_file)?)
    }
}
