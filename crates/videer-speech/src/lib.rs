//! Narration synthesis.
//!
//! Wraps the external TTS engine behind the [`SpeechSynthesizer`] trait.
//! The bundled implementation drives the `piper` CLI, trims leading silence
//! from its output (amplitude-threshold based, never touching the tail) and
//! caches one audio artifact per `(text, voice)` fingerprint.

pub mod error;
pub mod synth;
pub mod trim;

pub use error::{SpeechError, SpeechResult};
pub use synth::{PiperSynthesizer, SpeechClip, SpeechSynthesizer};
pub use trim::{trim_leading_silence, wav_duration, TrimConfig};
