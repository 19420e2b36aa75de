use std::io;
use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid string bytes: {0}")]
    InvalidString(#[from] FromUtf8Error),

    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),

    #[error("Invalid page size: expected {expected}, got {actual}")]
    InvalidPageSize { expected: usize, actual: usize },

    #[error("Offset out of bounds: offset={offset}, len={len}, page size={page_size}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        page_size: usize,
    },
}

pub type FileResult<T> = Result<T, FileError>;
