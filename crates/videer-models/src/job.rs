//! Render job definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::footage::FootagePrefs;
use crate::NarrationSegment;

/// Unique identifier for a render job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Toggles for the render stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Burn narration captions into the output video.
    #[serde(default)]
    pub burn_captions: bool,

    /// Optional title text overlaid on the opening frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_title: Option<String>,
}

impl RenderOptions {
    /// True when neither captions nor the overlay title are requested.
    ///
    /// Used to suppress the caption text preview diagnostic.
    pub fn text_disabled(&self) -> bool {
        !self.burn_captions && self.overlay_title.is_none()
    }
}

/// The whole unit of work: ordered narration segments plus render settings.
///
/// Owned exclusively by the orchestrator for its lifetime. Concurrent jobs
/// must not share a `RenderJob`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    /// Unique job ID
    pub id: JobId,

    /// Ordered narration segments
    pub segments: Vec<NarrationSegment>,

    /// Footage search preferences applied per segment
    #[serde(default)]
    pub footage: FootagePrefs,

    /// Render toggles (captions, overlay)
    #[serde(default)]
    pub options: RenderOptions,

    /// Final artifact path
    pub output: PathBuf,
}

impl RenderJob {
    /// Create a job with a fresh ID.
    pub fn new(segments: Vec<NarrationSegment>, options: RenderOptions, output: PathBuf) -> Self {
        Self {
            id: JobId::new(),
            segments,
            footage: FootagePrefs::default(),
            options,
            output,
        }
    }
}
