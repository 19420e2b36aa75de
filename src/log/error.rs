use crate::file::FileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Log record of {size} bytes does not fit in a log block ({capacity} bytes available)")]
    RecordTooLarge { size: usize, capacity: usize },

    #[error("Read past end of log record: offset={offset}, record length={len}")]
    ReadPastEnd { offset: usize, len: usize },
}

pub type LogResult<T> = Result<T, LogError>;
