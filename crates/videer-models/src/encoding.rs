//! Video encoding configuration.

use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";

/// Default output frame for landscape renders
pub const DEFAULT_FRAME_WIDTH: u32 = 1920;
pub const DEFAULT_FRAME_HEIGHT: u32 = 1080;
pub const DEFAULT_FPS: u32 = 30;

/// Video encoding configuration.
///
/// `width`/`height`/`fps` define the normalization target: stock clips come
/// in heterogeneous resolutions and frame rates and must be conformed before
/// concatenation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium", "slow")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Output frame width
    #[serde(default = "default_width")]
    pub width: u32,

    /// Output frame height
    #[serde(default = "default_height")]
    pub height: u32,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}
fn default_width() -> u32 {
    DEFAULT_FRAME_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_FRAME_HEIGHT
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
            fps: DEFAULT_FPS,
        }
    }
}

impl EncodingConfig {
    /// Duration of one output frame, seconds. Used as the tolerance when
    /// comparing planned video coverage against audio duration.
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.fps.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EncodingConfig::default();
        assert_eq!(cfg.codec, "libx264");
        assert_eq!(cfg.crf, 18);
        assert_eq!(cfg.width, 1920);
    }

    #[test]
    fn test_frame_duration() {
        let cfg = EncodingConfig::default();
        assert!((cfg.frame_duration() - 1.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let cfg: EncodingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.preset, "fast");
        assert_eq!(cfg.audio_bitrate, "128k");
    }
}
