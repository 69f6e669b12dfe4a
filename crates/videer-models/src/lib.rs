//! Shared data models for the Videer pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Render jobs and narration segments
//! - Footage queries and provider candidates
//! - Timeline entries and per-segment plans
//! - Encoding configuration
//! - Pipeline progress events

pub mod encoding;
pub mod event;
pub mod footage;
pub mod job;
pub mod segment;
pub mod timeline;

// Re-export common types
pub use encoding::EncodingConfig;
pub use event::{JobStage, PipelineEvent};
pub use footage::{
    FootageCandidate, FootagePrefs, FootageQuery, MinSize, Orientation, Quality, VideoFile,
};
pub use job::{JobId, RenderJob, RenderOptions};
pub use segment::NarrationSegment;
pub use timeline::{SegmentPlan, TimelineEntry};
