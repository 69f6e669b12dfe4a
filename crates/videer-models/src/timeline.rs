//! Timeline entries produced by the timeline builder.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One slice of a source clip placed on the output timeline.
///
/// `trim_in`/`trim_out` are offsets in seconds within the source clip.
/// Entries are ordered by segment index, then intra-segment clip order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Segment this slice belongs to.
    pub segment: usize,
    /// Local path of the source clip.
    pub clip: PathBuf,
    /// Start offset within the source clip, seconds.
    pub trim_in: f64,
    /// End offset within the source clip, seconds.
    pub trim_out: f64,
}

impl TimelineEntry {
    /// Duration of the selected slice.
    pub fn selected_duration(&self) -> f64 {
        self.trim_out - self.trim_in
    }
}

/// The planned timeline for one narration segment: ordered clip slices
/// covering the segment's audio, plus the audio track itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPlan {
    /// Segment index.
    pub segment: usize,
    /// Ordered clip slices; their durations sum to at least `audio_secs`.
    pub entries: Vec<TimelineEntry>,
    /// Synthesized narration audio for the segment.
    pub audio: PathBuf,
    /// Measured audio duration the entries must cover, seconds.
    pub audio_secs: f64,
}

impl SegmentPlan {
    /// Total video duration selected for this segment.
    pub fn video_secs(&self) -> f64 {
        self.entries.iter().map(TimelineEntry::selected_duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_duration() {
        let entry = TimelineEntry {
            segment: 0,
            clip: PathBuf::from("clip.mp4"),
            trim_in: 1.5,
            trim_out: 4.0,
        };
        assert!((entry.selected_duration() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_plan_video_secs_sums_entries() {
        let plan = SegmentPlan {
            segment: 0,
            entries: vec![
                TimelineEntry {
                    segment: 0,
                    clip: PathBuf::from("a.mp4"),
                    trim_in: 0.0,
                    trim_out: 5.0,
                },
                TimelineEntry {
                    segment: 0,
                    clip: PathBuf::from("b.mp4"),
                    trim_in: 0.0,
                    trim_out: 2.5,
                },
            ],
            audio: PathBuf::from("seg0.wav"),
            audio_secs: 7.5,
        };
        assert!((plan.video_secs() - 7.5).abs() < 1e-9);
    }
}
