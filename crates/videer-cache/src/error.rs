//! Cache error types.

use std::path::PathBuf;
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache root is not a directory: {0}")]
    InvalidRoot(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
