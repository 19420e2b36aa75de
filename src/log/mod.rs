//! Write-ahead log
//!
//! Records are arbitrary sequences of integers and strings packed into
//! fixed-size log blocks. Each record carries two trailing pointers so the
//! same blocks can be walked newest-first (undo) and oldest-first (redo).

mod error;
mod log_iterator;
mod log_manager;
mod record;

pub use error::{LogError, LogResult};
pub use log_iterator::{Direction, LogIterator};
pub use log_manager::LogManager;
pub use record::{LogRecord, LogValue};

/// Log sequence number: the number of the log block holding a record
pub type Lsn = usize;

/// Offset of the word holding the location of the last record's backward pointer
pub(crate) const LAST_POS: usize = 0;

/// Offset of the head sentinel for forward traversal
pub(crate) const FIRST_POS: usize = 4;

/// Bytes used by the two header words of every log block
pub(crate) const HEADER_SIZE: usize = 8;

/// Bytes used by the backward and forward pointers after every record
pub(crate) const TRAILER_SIZE: usize = 8;
