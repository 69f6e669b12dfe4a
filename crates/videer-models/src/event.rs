//! Pipeline progress events.
//!
//! The pipeline worker publishes these over a channel; the front-end
//! subscribes instead of polling shared state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of a render job.
///
/// Transitions are strictly forward; `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Parsing the script and validating inputs
    #[default]
    CollectingInputs,
    /// Searching and downloading stock footage
    ResolvingFootage,
    /// Synthesizing narration audio
    SynthesizingNarration,
    /// Planning clip trims against audio durations
    BuildingTimeline,
    /// Concatenating and muxing with the external encoder
    Rendering,
    /// Final artifact written
    Done,
    /// Terminal failure
    Failed,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::CollectingInputs => "collecting_inputs",
            JobStage::ResolvingFootage => "resolving_footage",
            JobStage::SynthesizingNarration => "synthesizing_narration",
            JobStage::BuildingTimeline => "building_timeline",
            JobStage::Rendering => "rendering",
            JobStage::Done => "done",
            JobStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Done | JobStage::Failed)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message published by the pipeline worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Log message with timestamp
    Log {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Progress update (0-100)
    Progress { value: u8 },

    /// The job entered a new stage
    StageChanged { stage: JobStage },

    /// Structured failure: the stage that failed and the underlying cause
    Error {
        stage: JobStage,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Final artifact written
    Done { output: String },
}

impl PipelineEvent {
    /// Convenience constructor for log events.
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Convenience constructor for error events.
    pub fn error(stage: JobStage, message: impl Into<String>) -> Self {
        Self::Error {
            stage,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
