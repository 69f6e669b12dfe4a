//! Render/mux stage: the three command shapes against the external encoder.
//!
//! 1. concat-list-driven assembly of the silent video stream
//! 2. concatenation of narration audio segments
//! 3. final mux with explicit stream mapping and optional caption burn-in
//!
//! The mux always selects streams by index (`-map 0:v:0 -map 1:a:0`);
//! default stream selection picks the wrong audio track when an input
//! carries a silent placeholder stream.

use std::path::Path;
use tracing::info;

use videer_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Inputs to the final mux.
#[derive(Debug, Clone)]
pub struct MuxInputs<'a> {
    /// Assembled silent video stream.
    pub video: &'a Path,
    /// Assembled narration audio stream.
    pub audio: &'a Path,
    /// Subtitle sidecar to burn in, when captions are enabled.
    pub subtitles: Option<&'a Path>,
    /// Title text drawn over the opening seconds.
    pub overlay_title: Option<&'a str>,
}

/// Concatenate and trim stock clips into one silent, format-normalized
/// video stream driven by a concat list file.
pub async fn assemble_video(
    runner: &FfmpegRunner,
    list_path: &Path,
    output: &Path,
    encoding: &EncodingConfig,
) -> MediaResult<()> {
    info!(
        list = %list_path.display(),
        output = %output.display(),
        "assembling video stream"
    );

    // Stock clips arrive in heterogeneous resolutions and frame rates;
    // normalize every frame to the target before concatenation.
    let normalize = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p",
        w = encoding.width,
        h = encoding.height,
        fps = encoding.fps
    );

    let cmd = FfmpegCommand::new(output)
        .input(list_path)
        .input_format("concat")
        .input_arg("-safe")
        .input_arg("0")
        .video_filter(normalize)
        .video_codec(&encoding.codec)
        .preset(&encoding.preset)
        .crf(encoding.crf)
        .no_audio();

    runner.run(&cmd).await
}

/// Concatenate narration audio segments into one encoded audio stream.
pub async fn assemble_audio(
    runner: &FfmpegRunner,
    list_path: &Path,
    output: &Path,
    encoding: &EncodingConfig,
) -> MediaResult<()> {
    info!(
        list = %list_path.display(),
        output = %output.display(),
        "assembling audio stream"
    );

    let cmd = FfmpegCommand::new(output)
        .input(list_path)
        .input_format("concat")
        .input_arg("-safe")
        .input_arg("0")
        .no_video()
        .audio_codec(&encoding.audio_codec)
        .audio_bitrate(&encoding.audio_bitrate);

    runner.run(&cmd).await
}

/// Mux the assembled video and audio streams into the final artifact.
///
/// Stream selection is explicit: video stream 0 of input 0, audio stream 0
/// of input 1, regardless of how many streams either input contains. When
/// captions or an overlay title are requested the video is re-encoded with
/// the corresponding filters; otherwise it is stream-copied.
pub async fn mux(
    runner: &FfmpegRunner,
    inputs: MuxInputs<'_>,
    output: &Path,
    encoding: &EncodingConfig,
) -> MediaResult<()> {
    info!(
        video = %inputs.video.display(),
        audio = %inputs.audio.display(),
        output = %output.display(),
        "muxing final video"
    );

    let mut cmd = FfmpegCommand::new(output)
        .input(inputs.video)
        .input(inputs.audio)
        .map(0, "v:0")
        .map(1, "a:0");

    let mut filters: Vec<String> = Vec::new();

    if let Some(subtitles) = inputs.subtitles {
        let path = subtitles
            .to_str()
            .ok_or_else(|| MediaError::list_format(format!(
                "non-UTF-8 subtitle path: {}",
                subtitles.display()
            )))?;
        filters.push(format!("subtitles={}", escape_filter_arg(path)));
    }

    if let Some(title) = inputs.overlay_title {
        filters.push(format!(
            "drawtext=text={}:fontcolor=white:fontsize=64:borderw=2:\
             x=(w-text_w)/2:y=h*0.12:enable='lt(t,4)'",
            escape_filter_arg(title)
        ));
    }

    if filters.is_empty() {
        cmd = cmd.video_codec("copy");
    } else {
        cmd = cmd
            .video_filter(filters.join(","))
            .video_codec(&encoding.codec)
            .preset(&encoding.preset)
            .crf(encoding.crf);
    }

    cmd = cmd.audio_codec("copy");

    runner.run(&cmd).await
}

/// Escape a value for use inside a filter argument: wrap in single quotes
/// with embedded quotes backslash-escaped, so `:` and `,` lose their
/// separator meaning.
fn escape_filter_arg(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str(r"'\''"),
            '\\' => out.push_str(r"\\"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}
