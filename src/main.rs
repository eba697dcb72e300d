use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vodladder::adapters::local::{FfmpegEncoder, FsAdapter};
use vodladder::domain::jobs::{RunSummary, VideoOutcome};
use vodladder::{
    BatchConfig, ConfigError, JobFile, JobRunner, Layout, MasterPlacement, Overrides, Profile,
    RunSettings,
};

#[derive(Parser)]
#[command(name = "vodladder")]
#[command(author, version, about = "Batch-convert videos into HLS rendition ladders")]
struct Cli {
    /// JSON job file listing the videos to process
    #[arg(env = "VIDEOS_FILE")]
    job_file: PathBuf,

    /// Plan and log every video without running the encoder
    #[arg(long)]
    dry_run: bool,

    /// Rendition profile (full, lean)
    #[arg(long)]
    profile: Option<Profile>,

    /// Output layout (nested, flat)
    #[arg(long)]
    layout: Option<Layout>,

    /// Master playlist placement (root, parent)
    #[arg(long)]
    master: Option<MasterPlacement>,

    /// Abandon an encode after this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Encoder binary to run
    #[arg(long, value_name = "PATH")]
    ffmpeg: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Loads `.env` before clap reads `VIDEOS_FILE`.
    let config = BatchConfig::from_env();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli, config).await {
        Ok(summary) if summary.has_failures() => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Result<BatchConfig, ConfigError>) -> Result<RunSummary> {
    let mut config = config.context("invalid environment configuration")?;
    if let Some(ffmpeg) = cli.ffmpeg {
        config.ffmpeg_path = ffmpeg;
    }
    if let Some(secs) = cli.timeout {
        config.encode_timeout = Some(Duration::from_secs(secs));
    }

    let job = JobFile::load(&cli.job_file)
        .with_context(|| format!("invalid job file {}", cli.job_file.display()))?;
    let overrides = Overrides {
        profile: cli.profile,
        layout: cli.layout,
        master: cli.master,
        dry_run: cli.dry_run,
    };
    let settings = RunSettings::resolve(&config, job, &overrides)
        .with_context(|| format!("invalid job file {}", cli.job_file.display()))?;

    info!(
        videos = settings.videos.len(),
        profile = settings.profile.as_str(),
        dry_run = settings.dry_run,
        "loaded job file"
    );

    let encoder = FfmpegEncoder::new(config.ffmpeg_path.clone(), config.encode_timeout);
    if !settings.dry_run {
        match encoder.version().await {
            Ok(version) => info!("using {}", version),
            Err(e) => warn!(
                "cannot run {}: {}; every encode will fail",
                encoder.program().display(),
                e
            ),
        }
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping the current encode");
            interrupt.cancel();
        }
    });

    let runner = JobRunner::from_settings(encoder, FsAdapter::new(), &settings);
    let summary = runner.run(&settings.videos, &cancel).await;
    print_summary(&summary);
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    println!("Summary:");
    for outcome in &summary.outcomes {
        match outcome {
            VideoOutcome::Processed { video, master } => println!("  ok       {} -> {}", video, master),
            VideoOutcome::Planned { video, .. } => println!("  planned  {}", video),
            VideoOutcome::Failed { video, error } => println!("  failed   {}: {}", video, error),
            VideoOutcome::Skipped { video } => println!("  skipped  {}", video),
        }
    }
}
