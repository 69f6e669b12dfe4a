//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("script is empty: no narration segments found")]
    EmptyScript,

    #[error(
        "segment {segment} under-covered: {available:.2}s of footage for {required:.2}s of narration"
    )]
    UnderCovered {
        segment: usize,
        required: f64,
        available: f64,
    },

    #[error("segment {segment} has no synthesized audio")]
    MissingAudio { segment: usize },

    #[error("job cancelled")]
    Cancelled,

    #[error("footage error: {0}")]
    Footage(#[from] videer_footage::FootageError),

    #[error("synthesis error: {0}")]
    Speech(#[from] videer_speech::SpeechError),

    #[error("render error: {0}")]
    Media(#[from] videer_media::MediaError),

    #[error("cache error: {0}")]
    Cache(#[from] videer_cache::CacheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
