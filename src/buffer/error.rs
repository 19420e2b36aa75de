use crate::file::FileError;
use crate::log::LogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BufferError {
    /// Every buffer is pinned. Expected under load; the caller decides
    /// whether to wait and retry.
    #[error("No unpinned buffer available")]
    Exhausted,

    #[error("Invalid buffer id: {0}")]
    InvalidBuffer(usize),

    #[error("Buffer is not pinned: {0}")]
    NotPinned(usize),

    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Log error: {0}")]
    Log(#[from] LogError),
}

pub type BufferResult<T> = Result<T, BufferError>;
