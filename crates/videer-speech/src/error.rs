//! Speech error types.

use thiserror::Error;

pub type SpeechResult<T> = Result<T, SpeechError>;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("TTS engine not found: {0}")]
    EngineNotFound(String),

    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("invalid audio: {0}")]
    InvalidAudio(String),

    #[error("cache error: {0}")]
    Cache(#[from] videer_cache::CacheError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpeechError {
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    pub fn invalid_audio(msg: impl Into<String>) -> Self {
        Self::InvalidAudio(msg.into())
    }
}
