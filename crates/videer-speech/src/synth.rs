//! Speech synthesis via the external TTS engine.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use videer_cache::{CacheKind, CacheManager, Fingerprint};

use crate::error::{SpeechError, SpeechResult};
use crate::trim::{trim_leading_silence, wav_duration, TrimConfig};

/// Name of the TTS engine binary.
const ENGINE_BINARY: &str = "piper";

/// A synthesized narration clip.
#[derive(Debug, Clone)]
pub struct SpeechClip {
    /// Cached audio artifact (16-bit PCM WAV).
    pub path: PathBuf,
    /// Measured duration in seconds, after leading-silence trim.
    pub duration_secs: f64,
}

/// Turns segment text into an audio artifact with a known duration.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with the given voice, or fail with a synthesis
    /// error. Re-requesting unchanged text is a cache hit.
    async fn synthesize(&self, text: &str, voice: &str) -> SpeechResult<SpeechClip>;
}

/// Adapter over the `piper` CLI: text on stdin, WAV on disk.
pub struct PiperSynthesizer {
    cache: CacheManager,
    binary: PathBuf,
    trim: TrimConfig,
}

impl PiperSynthesizer {
    /// Locate the engine on PATH.
    pub fn new(cache: CacheManager) -> SpeechResult<Self> {
        let binary = which::which(ENGINE_BINARY)
            .map_err(|_| SpeechError::EngineNotFound(ENGINE_BINARY.to_string()))?;
        Ok(Self::with_binary(cache, binary))
    }

    /// Use an explicit engine binary.
    pub fn with_binary(cache: CacheManager, binary: impl Into<PathBuf>) -> Self {
        Self {
            cache,
            binary: binary.into(),
            trim: TrimConfig::default(),
        }
    }

    /// Override silence-trim settings.
    pub fn with_trim(mut self, trim: TrimConfig) -> Self {
        self.trim = trim;
        self
    }

    async fn run_engine(&self, text: &str, voice: &str, output: &Path) -> SpeechResult<()> {
        let mut child = Command::new(&self.binary)
            .arg("--model")
            .arg(voice)
            .arg("--output_file")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let result = child.wait_with_output().await?;
        if !result.status.success() {
            return Err(SpeechError::synthesis(format!(
                "engine exited with status {:?}: {}",
                result.status.code(),
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechSynthesizer for PiperSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> SpeechResult<SpeechClip> {
        let fp = speech_fingerprint(text, voice);

        if let Some(path) = self.cache.get(CacheKind::Speech, &fp, "wav").await {
            debug!(voice = %voice, "speech cache hit");
            let duration_secs = blocking_duration(path.clone()).await?;
            return Ok(SpeechClip { path, duration_secs });
        }

        info!(voice = %voice, chars = text.len(), "synthesizing narration segment");

        let staged = self.cache.stage(CacheKind::Speech, &fp, "wav").await?;
        self.run_engine(text, voice, staged.path()).await?;

        // Trim before publishing so cache hits are already trimmed.
        let staged_path = staged.path().to_path_buf();
        let trim = self.trim;
        tokio::task::spawn_blocking(move || trim_leading_silence(&staged_path, trim))
            .await
            .map_err(|e| SpeechError::synthesis(format!("trim task panicked: {}", e)))??;

        let path = staged.publish().await?;
        let duration_secs = blocking_duration(path.clone()).await?;

        Ok(SpeechClip { path, duration_secs })
    }
}

/// Cache fingerprint for a `(text, voice)` request.
fn speech_fingerprint(text: &str, voice: &str) -> Fingerprint {
    Fingerprint::of(&format!("speech\x1f{}\x1f{}", voice, text))
}

/// Measure WAV duration off the async runtime.
async fn blocking_duration(path: PathBuf) -> SpeechResult<f64> {
    tokio::task::spawn_blocking(move || wav_duration(&path))
        .await
        .map_err(|e| SpeechError::synthesis(format!("probe task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_distinguishes_voice_and_text() {
        let a = speech_fingerprint("hello world", "amy");
        assert_eq!(a, speech_fingerprint("hello world", "amy"));
        assert_ne!(a, speech_fingerprint("hello world", "joe"));
        assert_ne!(a, speech_fingerprint("hello, world", "amy"));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_engine() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::open(dir.path()).await.unwrap();

        // Pre-seed the cache entry the synthesizer would produce.
        let fp = speech_fingerprint("good morning", "amy");
        let seeded = cache.entry_path(CacheKind::Speech, &fp, "wav");
        tokio::fs::create_dir_all(seeded.parent().unwrap())
            .await
            .unwrap();
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&seeded, spec).unwrap();
        for _ in 0..16_000 {
            writer.write_sample(1000i16).unwrap();
        }
        writer.finalize().unwrap();

        // A bogus binary path proves the engine is never spawned on a hit.
        let synth = PiperSynthesizer::with_binary(cache, "/nonexistent/piper");
        let clip = synth.synthesize("good morning", "amy").await.unwrap();
        assert_eq!(clip.path, seeded);
        assert!((clip.duration_secs - 1.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_missing_engine_is_synthesis_failure() {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::open(dir.path()).await.unwrap();

        let synth = PiperSynthesizer::with_binary(cache, "/nonexistent/piper");
        let err = synth.synthesize("anything", "amy").await.unwrap_err();
        assert!(matches!(err, SpeechError::Io(_)));
    }
}
