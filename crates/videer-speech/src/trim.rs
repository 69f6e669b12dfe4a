//! Leading-silence trimming for synthesized narration.
//!
//! Detection is amplitude-threshold based, not a fixed time offset: a fixed
//! offset risks cutting spoken content when the engine starts speaking
//! early. Only samples before the detected speech onset are removed, minus
//! a short pre-roll kept so consonant attacks survive; everything after the
//! onset, including trailing silence, is preserved untouched.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::debug;

use crate::error::{SpeechError, SpeechResult};

/// Silence detection settings.
#[derive(Debug, Clone, Copy)]
pub struct TrimConfig {
    /// Onset threshold as a fraction of full scale.
    pub threshold: f64,
    /// Seconds of audio kept before the detected onset.
    pub pre_roll_secs: f64,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            threshold: 0.01,
            pre_roll_secs: 0.05,
        }
    }
}

/// Duration of a WAV file in seconds.
pub fn wav_duration(path: impl AsRef<Path>) -> SpeechResult<f64> {
    let reader = WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}

/// Find the first frame whose amplitude crosses the threshold.
/// Returns `None` for all-silent audio.
fn find_onset_frame(samples: &[i16], channels: usize, threshold: f64) -> Option<usize> {
    let limit = (threshold * i16::MAX as f64) as i32;
    samples
        .chunks(channels.max(1))
        .position(|frame| frame.iter().any(|s| (*s as i32).abs() > limit))
}

/// Trim leading silence from a 16-bit PCM WAV in place.
///
/// Returns the number of seconds removed (0.0 when the file starts with
/// speech or contains none at all; an all-silent file is left untouched
/// rather than emptied).
pub fn trim_leading_silence(path: impl AsRef<Path>, config: TrimConfig) -> SpeechResult<f64> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(SpeechError::invalid_audio(format!(
            "expected 16-bit PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<_, _>>()?;
    let channels = spec.channels as usize;

    let onset_frame = match find_onset_frame(&samples, channels, config.threshold) {
        Some(frame) => frame,
        None => return Ok(0.0),
    };

    let pre_roll_frames = (config.pre_roll_secs * spec.sample_rate as f64) as usize;
    let start_frame = onset_frame.saturating_sub(pre_roll_frames);
    if start_frame == 0 {
        return Ok(0.0);
    }

    write_from_frame(path, spec, &samples, start_frame, channels)?;

    let removed = start_frame as f64 / spec.sample_rate as f64;
    debug!(
        path = %path.display(),
        removed_secs = format!("{:.3}", removed),
        "trimmed leading silence"
    );
    Ok(removed)
}

/// Rewrite the WAV starting at `start_frame`, via a temp file so a crash
/// mid-write cannot leave a truncated artifact in place.
fn write_from_frame(
    path: &Path,
    spec: WavSpec,
    samples: &[i16],
    start_frame: usize,
    channels: usize,
) -> SpeechResult<()> {
    let tmp = path.with_extension("trim-tmp");
    {
        let mut writer = WavWriter::create(&tmp, spec)?;
        for sample in &samples[start_frame * channels..] {
            writer.write_sample(*sample)?;
        }
        writer.finalize()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}
