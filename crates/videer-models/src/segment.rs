//! Narration segments.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One narration unit: a sentence or paragraph with its own synthesized
/// audio and assigned footage.
///
/// Segments are created from input text split at caller-defined boundaries
/// and are immutable once synthesized; `audio` and `duration_secs` are
/// populated by the synthesizer adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationSegment {
    /// Ordered index within the job (playback order).
    pub index: usize,

    /// Source narration text.
    pub text: String,

    /// Explicit footage-search text, replacing keywords derived from the
    /// narration when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_override: Option<String>,

    /// Voice identifier for synthesis.
    pub voice: String,

    /// Synthesized audio artifact, set after synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<PathBuf>,

    /// Measured audio duration in seconds, set after synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl NarrationSegment {
    /// Create an unsynthesized segment.
    pub fn new(index: usize, text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            search_override: None,
            voice: voice.into(),
            audio: None,
            duration_secs: None,
        }
    }

    /// The text used for footage search: the override when present,
    /// otherwise the narration itself.
    pub fn search_text(&self) -> &str {
        self.search_override.as_deref().unwrap_or(&self.text)
    }
}
