mod buffer;
mod buffer_manager;
mod error;
mod formatter;

pub use buffer_manager::{BufferId, BufferPoolManager};
pub use error::{BufferError, BufferResult};
pub use formatter::PageFormatter;

/// Identifier of the transaction that modified a buffer
pub type TxId = u32;
