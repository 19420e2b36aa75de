pub mod buffer;
pub mod config;
pub mod database;
pub mod file;
pub mod log;

pub use buffer::{BufferError, BufferId, BufferPoolManager, BufferResult, PageFormatter, TxId};
pub use config::{ConfigError, ConfigResult, StorageConfig};
pub use database::{Database, DatabaseError, DatabaseResult};
pub use file::{
    BLOCK_SIZE, BUFFER_POOL_SIZE, BlockId, FileError, FileManager, FileResult, MAX_BLOCK_SIZE,
    Page,
};
pub use log::{
    Direction, LogError, LogIterator, LogManager, LogRecord, LogResult, LogValue, Lsn,
};
