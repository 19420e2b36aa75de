mod block;
mod error;
mod file_manager;
mod page;

pub use block::BlockId;
pub use error::{FileError, FileResult};
pub use file_manager::FileManager;
pub use page::{INT_SIZE, Page};

/// Block size in bytes. Every page in the buffer pool and every log block
/// has exactly this many bytes unless a file manager is built with
/// [`FileManager::with_block_size`].
pub const BLOCK_SIZE: usize = 4096;

/// Largest supported block size; offsets inside a block are stored as `i32`
pub const MAX_BLOCK_SIZE: usize = i32::MAX as usize;

/// Number of buffers in the buffer pool
pub const BUFFER_POOL_SIZE: usize = 8;

/// Default name of the log file inside a database directory
pub const LOG_FILE: &str = "coredb.log";
