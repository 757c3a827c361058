mod args;
mod presenter;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soundpost_core::metrics::register_metrics;
use soundpost_core::{
    load_config, validate_config, CatboxHost, Config, FfmpegEncoder, HttpFetcher, JobMode,
    JobOutcome, JobRunner, MediaEncoder,
};

use args::{CliArgs, JobArgs};
use presenter::{present, OverwritePolicy};

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "SOUNDPOST_CONFIG";

/// Buffer size for the job event channel
const EVENT_BUFFER_SIZE: usize = 64;

/// Exit code when the user declined to overwrite.
const EXIT_CANCELLED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Initialize logging
    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<ExitCode> {
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

    // Load configuration
    if let Some(path) = &config_path {
        info!("Loading configuration from {:?}", path);
    }
    let config = load_config(config_path.as_deref()).context("Failed to load configuration")?;
    validate_config(&config).context("Configuration validation failed")?;

    match args.command.job() {
        Some((mode, job_args)) => run_job(&config, mode, job_args).await,
        None => {
            let printed = toml::to_string_pretty(&config.sanitized())
                .context("Failed to render configuration")?;
            print!("{}", printed);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_job(
    config: &Config,
    mode: JobMode,
    job_args: &JobArgs,
) -> Result<ExitCode> {
    let registry = Registry::new();
    register_metrics(&registry).context("Failed to register metrics")?;

    // External collaborators
    let encoder = Arc::new(FfmpegEncoder::new(config.encoder.clone()));
    encoder
        .validate()
        .await
        .context("ffmpeg/ffprobe are not available; install them or set [encoder] paths")?;
    let fetcher =
        Arc::new(HttpFetcher::new(config.download.clone()).context("Failed to create downloader")?);
    let host =
        Arc::new(CatboxHost::new(config.upload.clone()).context("Failed to create uploader")?);

    let mut request = config.job.request(&job_args.source, mode);
    if let Some(container) = job_args.container {
        request = request.with_container(container.into());
    }
    if let Some(bytes) = job_args.target_size {
        request = request.with_target_size(bytes);
    }
    if job_args.delete_original {
        request = request.with_preserve_original(false);
    }

    let policy = if job_args.yes {
        OverwritePolicy::Always
    } else if job_args.no_clobber {
        OverwritePolicy::Never
    } else {
        OverwritePolicy::Ask
    };

    let runner = Arc::new(JobRunner::new(
        encoder,
        fetcher,
        host,
        config.runner_settings(),
    ));
    let (tx, rx) = mpsc::channel(EVENT_BUFFER_SIZE);
    let worker = runner.spawn(request, tx);

    let presented = present(rx, policy).await;
    let outcome = match presented {
        Some(outcome) => outcome,
        None => worker.await.context("Job worker panicked")?,
    };

    if job_args.metrics {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        print!("{}", String::from_utf8_lossy(&buffer));
    }

    Ok(match outcome {
        JobOutcome::Succeeded { final_path, .. } => {
            println!("{}", final_path.display());
            ExitCode::SUCCESS
        }
        JobOutcome::CancelledByUser => ExitCode::from(EXIT_CANCELLED),
        JobOutcome::Failed { kind, message } => {
            eprintln!("soundpost: {} error: {}", kind, message);
            ExitCode::FAILURE
        }
    })
}
