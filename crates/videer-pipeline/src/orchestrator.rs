//! Job orchestration.
//!
//! One render job runs as a background tokio task so the interactive
//! surface stays responsive. Stages execute strictly forward; the only
//! concurrency inside a job is footage resolution across independent
//! segments, whose results are kept in segment order. Cancellation is a
//! cooperative check before each stage; artifacts consumed by the job are
//! pinned in the cache until the job ends, and nothing created before a
//! failure is deleted, so a re-run reuses cache hits instead of redoing
//! work.

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use videer_cache::{CacheManager, PinGuard};
use videer_footage::{FootageResolver, ResolveOutcome};
use videer_media::command::FfmpegRunner;
use videer_media::concat::{write_concat_list, ConcatEntry};
use videer_media::probe::media_duration;
use videer_media::render::{assemble_audio, assemble_video, mux, MuxInputs};
use videer_media::subtitle::{remove_sidecar, write_sidecar, SubtitleCue};
use videer_models::{
    EncodingConfig, FootageCandidate, JobId, JobStage, PipelineEvent, RenderJob, SegmentPlan,
};
use videer_speech::SpeechSynthesizer;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::timeline::plan_segment;

/// Shared services injected at pipeline construction, so tests can use
/// isolated cache roots and mock providers.
struct PipelineShared {
    config: PipelineConfig,
    cache: CacheManager,
    resolver: FootageResolver,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    encoding: EncodingConfig,
}

/// Spawns and tracks render jobs.
#[derive(Clone)]
pub struct Pipeline {
    shared: Arc<PipelineShared>,
}

/// Handle to a running job: its event stream, a cancellation trigger and
/// the join handle for the final result.
pub struct JobHandle {
    pub id: JobId,
    pub events: mpsc::UnboundedReceiver<PipelineEvent>,
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<PipelineResult<PathBuf>>,
}

impl JobHandle {
    /// Request cooperative cancellation. The job stops before its next
    /// stage; the cache is left consistent.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Wait for the job to finish.
    pub async fn join(self) -> PipelineResult<PathBuf> {
        self.handle
            .await
            .map_err(|e| PipelineError::Io(std::io::Error::other(e)))?
    }
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        cache: CacheManager,
        resolver: FootageResolver,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            shared: Arc::new(PipelineShared {
                config,
                cache,
                resolver,
                synthesizer,
                encoding: EncodingConfig::default(),
            }),
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        let shared = Arc::get_mut(&mut self.shared)
            .expect("with_encoding must be called before jobs are spawned");
        shared.encoding = encoding;
        self
    }

    /// Spawn a job on a background task and return its handle.
    pub fn spawn(&self, job: RenderJob) -> JobHandle {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let id = job.id.clone();
        let shared = Arc::clone(&self.shared);

        let handle = tokio::spawn(async move {
            let logger = JobLogger::new(&job.id);
            match run_job(shared, job, &event_tx, cancel_rx).await {
                Ok(output) => {
                    logger.log_completion(&format!("output written to {}", output.display()));
                    let _ = event_tx.send(PipelineEvent::Done {
                        output: output.display().to_string(),
                    });
                    Ok(output)
                }
                Err((stage, error)) => {
                    logger.log_error(stage, &error.to_string());
                    let _ = event_tx.send(PipelineEvent::error(stage, error.to_string()));
                    Err(error)
                }
            }
        });

        JobHandle {
            id,
            events: event_rx,
            cancel_tx,
            handle,
        }
    }
}

/// Per-segment footage, kept in segment order.
type SegmentCandidates = Vec<Vec<FootageCandidate>>;

async fn run_job(
    shared: Arc<PipelineShared>,
    mut job: RenderJob,
    events: &mpsc::UnboundedSender<PipelineEvent>,
    cancel_rx: watch::Receiver<bool>,
) -> Result<PathBuf, (JobStage, PipelineError)> {
    let logger = JobLogger::new(&job.id);

    let enter = |stage: JobStage| -> Result<(), (JobStage, PipelineError)> {
        if *cancel_rx.borrow() {
            return Err((stage, PipelineError::Cancelled));
        }
        logger.log_stage(stage);
        let _ = events.send(PipelineEvent::StageChanged { stage });
        Ok(())
    };
    let progress = |value: u8| {
        let _ = events.send(PipelineEvent::Progress { value });
    };
    let log = |message: String| {
        let _ = events.send(PipelineEvent::log(message));
    };

    // Pins held for the job's lifetime: eviction must not touch artifacts
    // an in-flight job is consuming.
    let mut pins: Vec<PinGuard> = Vec::new();

    // --- Collecting inputs ---
    enter(JobStage::CollectingInputs)?;
    let stage = JobStage::CollectingInputs;
    if job.segments.is_empty() {
        return Err((stage, PipelineError::EmptyScript));
    }
    let job_dir = shared.config.work_dir.join("jobs").join(job.id.as_str());
    tokio::fs::create_dir_all(&job_dir)
        .await
        .map_err(|e| (stage, e.into()))?;
    log(format!("{} narration segments", job.segments.len()));
    progress(5);

    // --- Resolving footage ---
    enter(JobStage::ResolvingFootage)?;
    let stage = JobStage::ResolvingFootage;
    let candidates = resolve_all(&shared, &job, events, &mut pins)
        .await
        .map_err(|e| (stage, e))?;
    progress(40);

    // --- Synthesizing narration ---
    enter(JobStage::SynthesizingNarration)?;
    let stage = JobStage::SynthesizingNarration;
    synthesize_all(&shared, &mut job, events, &mut pins)
        .await
        .map_err(|e| (stage, e))?;
    progress(60);

    // --- Building timeline ---
    enter(JobStage::BuildingTimeline)?;
    let stage = JobStage::BuildingTimeline;
    let tolerance = shared.encoding.frame_duration();
    let mut plans: Vec<SegmentPlan> = Vec::with_capacity(job.segments.len());
    for segment in &job.segments {
        let audio = segment
            .audio
            .as_ref()
            .ok_or((stage, PipelineError::MissingAudio { segment: segment.index }))?;
        let audio_secs = segment
            .duration_secs
            .ok_or((stage, PipelineError::MissingAudio { segment: segment.index }))?;
        let plan = plan_segment(
            segment.index,
            audio,
            audio_secs,
            &candidates[segment.index],
            tolerance,
        )
        .map_err(|e| (stage, e))?;
        plans.push(plan);
    }
    log(format!(
        "timeline covers {:.1}s across {} clips",
        plans.iter().map(|p| p.audio_secs).sum::<f64>(),
        plans.iter().map(|p| p.entries.len()).sum::<usize>()
    ));
    progress(70);

    // --- Rendering ---
    enter(JobStage::Rendering)?;
    let stage = JobStage::Rendering;
    let output = render(&shared, &job, &plans, &job_dir, events)
        .await
        .map_err(|e| (stage, e))?;
    progress(100);

    drop(pins);
    Ok(output)
}

/// Resolve footage for every segment, concurrently but order-preserving.
async fn resolve_all(
    shared: &PipelineShared,
    job: &RenderJob,
    events: &mpsc::UnboundedSender<PipelineEvent>,
    pins: &mut Vec<PinGuard>,
) -> PipelineResult<SegmentCandidates> {
    let queries: Vec<_> = job
        .segments
        .iter()
        .map(|s| (s.index, job.footage.query_for(s.search_text())))
        .collect();

    let outcomes: Vec<(usize, Result<ResolveOutcome, _>)> = stream::iter(
        queries
            .into_iter()
            .map(|(index, query)| async move {
                (index, shared.resolver.resolve(&query).await)
            }),
    )
    .buffered(shared.config.max_segment_parallel.max(1))
    .collect()
    .await;

    let mut all = vec![Vec::new(); job.segments.len()];
    for (index, outcome) in outcomes {
        let outcome = outcome?;
        for failure in &outcome.failures {
            let _ = events.send(PipelineEvent::log(format!(
                "segment {}: candidate {} failed: {}",
                index, failure.candidate_id, failure.error
            )));
        }
        for candidate in &outcome.candidates {
            if let Some(path) = &candidate.local_path {
                pins.push(shared.cache.pin(path));
            }
        }
        let _ = events.send(PipelineEvent::log(format!(
            "segment {}: {} clips ready",
            index,
            outcome.candidates.len()
        )));
        all[index] = outcome.candidates;
    }
    Ok(all)
}

/// Synthesize narration for every segment, in order.
async fn synthesize_all(
    shared: &PipelineShared,
    job: &mut RenderJob,
    events: &mpsc::UnboundedSender<PipelineEvent>,
    pins: &mut Vec<PinGuard>,
) -> PipelineResult<()> {
    for segment in &mut job.segments {
        let clip = shared
            .synthesizer
            .synthesize(&segment.text, &segment.voice)
            .await?;
        debug!(
            segment = segment.index,
            duration = format!("{:.2}s", clip.duration_secs),
            "narration segment synthesized"
        );
        let _ = events.send(PipelineEvent::log(format!(
            "segment {}: narration is {:.1}s",
            segment.index, clip.duration_secs
        )));
        pins.push(shared.cache.pin(&clip.path));
        segment.audio = Some(clip.path);
        segment.duration_secs = Some(clip.duration_secs);
    }
    Ok(())
}

/// Assemble the video and audio streams and mux the final artifact.
async fn render(
    shared: &PipelineShared,
    job: &RenderJob,
    plans: &[SegmentPlan],
    job_dir: &std::path::Path,
    events: &mpsc::UnboundedSender<PipelineEvent>,
) -> PipelineResult<PathBuf> {
    let runner = FfmpegRunner::new().with_timeout(shared.config.ffmpeg_timeout.as_secs());

    // Video concat list: every planned slice, in timeline order.
    let video_entries: Vec<ConcatEntry> = plans
        .iter()
        .flat_map(|p| p.entries.iter())
        .map(|e| ConcatEntry::trimmed(&e.clip, e.trim_in, e.trim_out))
        .collect();
    let video_list = job_dir.join("video_concat.txt");
    write_concat_list(&video_list, &video_entries).await?;

    // Audio concat list: one narration file per segment.
    let audio_entries: Vec<ConcatEntry> =
        plans.iter().map(|p| ConcatEntry::whole(&p.audio)).collect();
    let audio_list = job_dir.join("audio_concat.txt");
    write_concat_list(&audio_list, &audio_entries).await?;

    let video_stream = job_dir.join("video.mp4");
    assemble_video(&runner, &video_list, &video_stream, &shared.encoding).await?;

    let audio_stream = job_dir.join("audio.m4a");
    assemble_audio(&runner, &audio_list, &audio_stream, &shared.encoding).await?;

    let video_secs = media_duration(&video_stream).await?;
    let audio_secs = media_duration(&audio_stream).await?;
    let _ = events.send(PipelineEvent::log(format!(
        "assembled streams: {:.1}s video, {:.1}s audio",
        video_secs, audio_secs
    )));

    // Subtitle sidecar: write when captions are on; otherwise make sure no
    // stale sidecar from an earlier run of this job can be picked up.
    let sidecar = if job.options.burn_captions {
        let cues = caption_cues(plans, job);
        Some(write_sidecar(&job.output, &cues).await?)
    } else {
        remove_sidecar(&job.output).await?;
        None
    };

    if !job.options.text_disabled() {
        // Text preview diagnostic, suppressed when captions and overlay
        // are both off.
        let preview: Vec<String> = job
            .options
            .overlay_title
            .iter()
            .cloned()
            .chain(job.segments.iter().map(|s| s.text.clone()))
            .take(3)
            .collect();
        let _ = events.send(PipelineEvent::log(format!(
            "burned text preview: {}",
            preview.join(" | ")
        )));
    }

    if let Some(parent) = job.output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    mux(
        &runner,
        MuxInputs {
            video: &video_stream,
            audio: &audio_stream,
            subtitles: sidecar.as_deref(),
            overlay_title: job.options.overlay_title.as_deref(),
        },
        &job.output,
        &shared.encoding,
    )
    .await?;

    Ok(job.output.clone())
}

/// Caption cues on the output timeline: each segment's text over its audio
/// span.
fn caption_cues(plans: &[SegmentPlan], job: &RenderJob) -> Vec<SubtitleCue> {
    let mut cues = Vec::with_capacity(plans.len());
    let mut clock = 0.0;
    for plan in plans {
        let text = job
            .segments
            .get(plan.segment)
            .map(|s| s.text.clone())
            .unwrap_or_default();
        cues.push(SubtitleCue {
            start: clock,
            end: clock + plan.audio_secs,
            text,
        });
        clock += plan.audio_secs;
    }
    cues
}
