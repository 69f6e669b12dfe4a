//! Timeline planning.
//!
//! Pure logic: given a segment's measured audio duration and its resolved
//! footage candidates, produce the ordered clip slices that cover the
//! narration. Video must never run out before the narration ends; when the
//! available footage cannot cover the requirement the segment is flagged
//! under-covered instead of silently producing a short video.

use tracing::debug;

use videer_models::{FootageCandidate, SegmentPlan, TimelineEntry};

use crate::error::{PipelineError, PipelineResult};

/// Plan one segment's timeline.
///
/// Policy: a single sufficient clip is trimmed from its start to the exact
/// requirement. Otherwise candidates are chained whole, in resolver order,
/// and the last clip in the chain is trimmed to the remainder. Coverage is
/// exact within `tolerance` (one frame duration).
pub fn plan_segment(
    segment: usize,
    audio: &std::path::Path,
    audio_secs: f64,
    candidates: &[FootageCandidate],
    tolerance: f64,
) -> PipelineResult<SegmentPlan> {
    let mut entries: Vec<TimelineEntry> = Vec::new();
    let mut remaining = audio_secs;

    for candidate in candidates {
        if remaining <= tolerance {
            break;
        }
        let clip = match &candidate.local_path {
            Some(path) => path.clone(),
            None => continue,
        };
        if candidate.duration <= 0.0 {
            continue;
        }

        let take = candidate.duration.min(remaining);
        entries.push(TimelineEntry {
            segment,
            clip,
            trim_in: 0.0,
            trim_out: take,
        });
        remaining -= take;
    }

    if remaining > tolerance {
        return Err(PipelineError::UnderCovered {
            segment,
            required: audio_secs,
            available: audio_secs - remaining,
        });
    }

    debug!(
        segment = segment,
        clips = entries.len(),
        audio_secs = format!("{:.2}", audio_secs),
        "segment timeline planned"
    );

    Ok(SegmentPlan {
        segment,
        entries,
        audio: audio.to_path_buf(),
        audio_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const TOLERANCE: f64 = 1.0 / 30.0;

    fn candidate(id: u64, duration: f64, resolved: bool) -> FootageCandidate {
        FootageCandidate {
            id,
            duration,
            width: 1920,
            height: 1080,
            creator: String::new(),
            page_url: String::new(),
            files: vec![],
            local_path: resolved.then(|| PathBuf::from(format!("/work/footage/{}.mp4", id))),
        }
    }

    #[test]
    fn test_single_sufficient_clip_trimmed_to_requirement() {
        let plan = plan_segment(
            0,
            std::path::Path::new("seg0.wav"),
            8.0,
            &[candidate(1, 20.0, true)],
            TOLERANCE,
        )
        .unwrap();

        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].trim_in, 0.0);
        assert!((plan.entries[0].trim_out - 8.0).abs() < 1e-9);
        assert!((plan.video_secs() - 8.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_chaining_trims_last_clip_to_remainder() {
        let plan = plan_segment(
            2,
            std::path::Path::new("seg2.wav"),
            12.0,
            &[candidate(1, 5.0, true), candidate(2, 10.0, true)],
            TOLERANCE,
        )
        .unwrap();

        assert_eq!(plan.entries.len(), 2);
        // First clip used whole, second trimmed to the 7s remainder.
        assert!((plan.entries[0].trim_out - 5.0).abs() < 1e-9);
        assert!((plan.entries[1].trim_out - 7.0).abs() < 1e-9);
        assert!((plan.video_secs() - 12.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_under_covered_segment_aborts_with_index() {
        // 12 seconds of narration, only 5s + 4s of footage.
        let err = plan_segment(
            3,
            std::path::Path::new("seg3.wav"),
            12.0,
            &[candidate(1, 5.0, true), candidate(2, 4.0, true)],
            TOLERANCE,
        )
        .unwrap_err();

        match err {
            PipelineError::UnderCovered {
                segment,
                required,
                available,
            } => {
                assert_eq!(segment, 3);
                assert!((required - 12.0).abs() < 1e-9);
                assert!((available - 9.0).abs() < 1e-9);
            }
            other => panic!("expected UnderCovered, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_candidates_are_skipped() {
        let plan = plan_segment(
            0,
            std::path::Path::new("seg0.wav"),
            3.0,
            &[candidate(1, 10.0, false), candidate(2, 10.0, true)],
            TOLERANCE,
        )
        .unwrap();

        assert_eq!(plan.entries.len(), 1);
        assert!(plan.entries[0].clip.to_string_lossy().contains("2.mp4"));
    }

    #[test]
    fn test_no_candidates_reports_zero_available() {
        let err = plan_segment(
            1,
            std::path::Path::new("seg1.wav"),
            6.0,
            &[],
            TOLERANCE,
        )
        .unwrap_err();

        match err {
            PipelineError::UnderCovered { available, .. } => {
                assert_eq!(available, 0.0);
            }
            other => panic!("expected UnderCovered, got {:?}", other),
        }
    }

    #[test]
    fn test_coverage_within_frame_tolerance() {
        // Requirement within a frame of the clip's duration: no second clip.
        let plan = plan_segment(
            0,
            std::path::Path::new("seg0.wav"),
            5.02,
            &[candidate(1, 5.0, true), candidate(2, 5.0, true)],
            TOLERANCE,
        )
        .unwrap();
        assert_eq!(plan.entries.len(), 1);
    }
}
