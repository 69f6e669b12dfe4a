//! SRT sidecar generation for narration captions.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::MediaResult;

/// One caption: text shown over a time range.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    /// Start time on the output timeline, seconds.
    pub start: f64,
    /// End time on the output timeline, seconds.
    pub end: f64,
    pub text: String,
}

/// Sidecar path for a job's subtitles, next to the output file.
pub fn sidecar_path(output: &Path) -> PathBuf {
    output.with_extension("srt")
}

/// Write the SRT sidecar for a job, returning its path.
pub async fn write_sidecar(output: &Path, cues: &[SubtitleCue]) -> MediaResult<PathBuf> {
    let path = sidecar_path(output);
    fs::write(&path, render_srt(cues)).await?;
    Ok(path)
}

/// Remove a previously generated sidecar if present.
///
/// Called when captions are disabled so a stale sidecar from an earlier run
/// of the same job can never be picked up again.
pub async fn remove_sidecar(output: &Path) -> MediaResult<()> {
    let path = sidecar_path(output);
    match fs::remove_file(&path).await {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale subtitle sidecar");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Render cues as SRT.
pub fn render_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(cue.start),
            format_timestamp(cue.end),
            cue.text.trim()
        ));
    }
    out
}

/// SRT timestamp: `HH:MM:SS,mmm`.
fn format_timestamp(secs: f64) -> String {
    let total_millis = (secs.max(0.0) * 1000.0).round() as u64;
    let millis = total_millis % 1000;
    let total_secs = total_millis / 1000;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3600;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, millis)
}
