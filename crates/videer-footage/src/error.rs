//! Footage error types.

use thiserror::Error;

pub type FootageResult<T> = Result<T, FootageError>;

#[derive(Debug, Error)]
pub enum FootageError {
    /// Bad or missing credential, or unreachable provider.
    #[error("connection error: {0}")]
    Connection(String),

    /// Malformed query or zero results.
    #[error("search failed: {0}")]
    Search(String),

    /// Network failure after retries exhausted; any partial file removed.
    #[error("download failed: {0}")]
    Download(String),

    #[error("cache error: {0}")]
    Cache(#[from] videer_cache::CacheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FootageError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    /// Whether retrying can help. Search failures are deterministic
    /// (malformed query, zero results) and are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FootageError::Connection(_) | FootageError::Download(_) | FootageError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(FootageError::connection("timed out").is_retryable());
        assert!(FootageError::download("reset by peer").is_retryable());
        assert!(!FootageError::search("no results").is_retryable());
    }
}
