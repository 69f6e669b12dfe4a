//! Videer command-line interface.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use videer_cache::CacheManager;
use videer_footage::{FootageResolver, PexelsClient};
use videer_models::{
    FootagePrefs, JobStage, MinSize, Orientation, PipelineEvent, Quality, RenderJob, RenderOptions,
};
use videer_pipeline::{parse_script, Pipeline, PipelineConfig};
use videer_speech::PiperSynthesizer;

#[derive(Parser)]
#[command(
    name = "videer",
    version,
    about = "Generate narrated videos from stock footage"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a narrated video from a script file
    Render(RenderArgs),
    /// Search the footage provider and list candidates
    Search(SearchArgs),
    /// Delete cache entries older than the age threshold
    Clean(CleanArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Narration script: blank-line separated segments; a `>> keywords`
    /// line inside a segment overrides its footage search
    #[arg(long)]
    script: PathBuf,

    /// Voice model for narration synthesis
    #[arg(long, default_value = "en_US-amy-medium.onnx")]
    voice: String,

    /// Stock clips requested per segment (1-80)
    #[arg(long, default_value_t = 5)]
    clips_per_segment: u32,

    /// Clip orientation: landscape, portrait or square
    #[arg(long, default_value = "landscape")]
    orientation: Orientation,

    /// Download quality: hd or sd
    #[arg(long, default_value = "hd")]
    quality: Quality,

    /// Minimum clip size: large, medium or small
    #[arg(long, default_value = "medium")]
    min_size: MinSize,

    /// Burn narration captions into the video
    #[arg(long)]
    captions: bool,

    /// Title text overlaid on the opening frames
    #[arg(long)]
    overlay_title: Option<String>,

    /// Output file (defaults to outputs/<job-id>.mp4)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct SearchArgs {
    /// Search keywords
    #[arg(long)]
    query: String,

    /// Number of results (1-80)
    #[arg(long, default_value_t = 5)]
    count: u32,

    #[arg(long, default_value = "landscape")]
    orientation: Orientation,

    #[arg(long, default_value = "hd")]
    quality: Quality,

    #[arg(long, default_value = "medium")]
    min_size: MinSize,
}

#[derive(Args)]
struct CleanArgs {
    /// Delete cache entries older than this many days
    #[arg(long, default_value_t = 30)]
    days: u64,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Render(args) => run_render(args).await,
        Command::Search(args) => run_search(args).await,
        Command::Clean(args) => run_clean(args).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing with colored output for dev, JSON for production.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = PipelineConfig::from_env();
    let cache = CacheManager::open(&config.work_dir).await?;

    let client = PexelsClient::from_env().context("cannot connect to the footage provider")?;
    let resolver = FootageResolver::new(client, cache.clone(), config.retry_policy())
        .with_max_parallel(config.max_download_parallel);
    let synthesizer =
        Arc::new(PiperSynthesizer::new(cache.clone()).context("narration engine unavailable")?);

    let script = tokio::fs::read_to_string(&args.script)
        .await
        .with_context(|| format!("cannot read script {}", args.script.display()))?;
    let segments = parse_script(&script, &args.voice)?;

    let mut job = RenderJob::new(
        segments,
        RenderOptions {
            burn_captions: args.captions,
            overlay_title: args.overlay_title,
        },
        PathBuf::new(),
    );
    job.footage = FootagePrefs {
        count: args.clips_per_segment,
        orientation: args.orientation,
        quality: args.quality,
        min_size: args.min_size,
    };
    job.output = args.output.unwrap_or_else(|| {
        config.outputs_dir.join(format!("{}.mp4", job.id))
    });

    println!("Rendering job {} ({} segments)", job.id, job.segments.len());

    let pipeline = Pipeline::new(config, cache, resolver, synthesizer);
    let mut handle = pipeline.spawn(job);

    while let Some(event) = handle.events.recv().await {
        match event {
            PipelineEvent::StageChanged { stage } => {
                if !stage.is_terminal() {
                    println!("==> {}", stage_label(stage));
                }
            }
            PipelineEvent::Progress { value } => println!("    {}%", value),
            PipelineEvent::Log { message, .. } => println!("    {}", message),
            PipelineEvent::Error { stage, message, .. } => {
                println!("!! failed while {}: {}", stage_label(stage), message)
            }
            PipelineEvent::Done { output } => println!("Done: {}", output),
        }
    }

    let output = handle.join().await?;
    println!("Final video: {}", output.display());
    Ok(())
}

fn stage_label(stage: JobStage) -> &'static str {
    match stage {
        JobStage::CollectingInputs => "collecting inputs",
        JobStage::ResolvingFootage => "resolving footage",
        JobStage::SynthesizingNarration => "synthesizing narration",
        JobStage::BuildingTimeline => "building timeline",
        JobStage::Rendering => "rendering",
        JobStage::Done => "done",
        JobStage::Failed => "failed",
    }
}

async fn run_search(args: SearchArgs) -> anyhow::Result<()> {
    let client = PexelsClient::from_env().context("cannot connect to the footage provider")?;

    let mut query = videer_models::FootageQuery::new(args.query);
    query.count = args.count;
    query.orientation = args.orientation;
    query.quality = args.quality;
    query.min_size = args.min_size;

    let candidates = client.search(&query).await?;
    println!("Found {} candidates:\n", candidates.len());
    for (i, c) in candidates.iter().enumerate() {
        println!("{}. id {}", i + 1, c.id);
        println!("   duration: {:.0}s, {}x{}px", c.duration, c.width, c.height);
        println!("   creator: {}", c.creator);
        println!("   page: {}", c.page_url);
        let qualities: Vec<&str> = c
            .files
            .iter()
            .filter_map(|f| f.quality.as_deref())
            .collect();
        println!("   qualities: {}\n", qualities.join(", "));
    }
    Ok(())
}

async fn run_clean(args: CleanArgs) -> anyhow::Result<()> {
    let config = PipelineConfig::from_env();
    let cache = CacheManager::open(&config.work_dir).await?;

    let max_age = std::time::Duration::from_secs(args.days * 24 * 3600);
    let report = cache.evict_older_than(max_age).await?;
    println!(
        "Removed {} files, reclaimed {} bytes",
        report.files_removed, report.bytes_reclaimed
    );
    Ok(())
}
