//! Job runner: drives one request through validation, acquisition,
//! transformation, size targeting and finalization.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::RunnerSettings;
use super::error::JobError;
use super::finalize::{destination_path, place};
use super::types::{JobEvent, JobMode, JobOutcome, JobRequest, JobState};
use super::workspace::Workspace;
use crate::acquire::{download_file_name, AcquireError, AudioFetcher};
use crate::classify::{classify, AssetKind};
use crate::compressor::SizeTargetingCompressor;
use crate::encoder::{MediaEncoder, Transcoder};
use crate::metrics;
use crate::tag;
use crate::upload::AudioHost;

/// What validation established about the source.
enum Plan {
    Inject { audio_url: String, kind: AssetKind },
    Extract,
}

/// How a job that did not fail ended.
enum Completion {
    Placed {
        final_path: PathBuf,
        hosted_url: Option<String>,
    },
    Declined,
}

/// The output sitting in the workspace, ready to be placed.
struct Staged {
    path: PathBuf,
    hosted_url: Option<String>,
}

/// Emits job events. A presentation layer that stopped listening is not an error.
struct Reporter<'a> {
    tx: &'a mpsc::Sender<JobEvent>,
    job_id: &'a str,
}

impl Reporter<'_> {
    async fn state(&self, state: JobState) {
        debug!(job_id = self.job_id, state = %state, "Job state");
        let _ = self.tx.send(JobEvent::State(state)).await;
    }

    async fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!(job_id = self.job_id, "{}", message);
        let _ = self.tx.send(JobEvent::Log(message)).await;
    }

    /// Blocks until the presentation layer answers. No answer means no.
    async fn confirm_overwrite(&self, path: &Path) -> bool {
        let (reply, answer) = oneshot::channel();
        let request = JobEvent::ConfirmOverwrite {
            path: path.to_path_buf(),
            reply,
        };
        if self.tx.send(request).await.is_err() {
            return false;
        }
        answer.await.unwrap_or(false)
    }

    async fn finished(&self, outcome: JobOutcome) {
        let _ = self.tx.send(JobEvent::Finished(outcome)).await;
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Runs soundpost jobs, one at a time, against a set of collaborators.
pub struct JobRunner<E: MediaEncoder, F: AudioFetcher, H: AudioHost> {
    fetcher: Arc<F>,
    host: Arc<H>,
    transcoder: Transcoder<E>,
    compressor: SizeTargetingCompressor<E>,
    settings: RunnerSettings,
}

impl<E: MediaEncoder, F: AudioFetcher, H: AudioHost> JobRunner<E, F, H> {
    /// Creates a runner.
    pub fn new(encoder: Arc<E>, fetcher: Arc<F>, host: Arc<H>, settings: RunnerSettings) -> Self {
        let transcoder = Transcoder::new(Arc::clone(&encoder));
        let compressor = SizeTargetingCompressor::new(encoder, settings.compressor.clone());
        Self {
            fetcher,
            host,
            transcoder,
            compressor,
            settings,
        }
    }

    /// Runs a job to completion, reporting over `events`.
    ///
    /// Always returns exactly one outcome, which is also sent as the final
    /// [`JobEvent::Finished`]. The workspace is removed before returning.
    pub async fn run(&self, request: JobRequest, events: mpsc::Sender<JobEvent>) -> JobOutcome {
        let job_id = Uuid::new_v4().simple().to_string();
        let reporter = Reporter {
            tx: &events,
            job_id: &job_id,
        };
        let started = Instant::now();
        info!(
            job_id = %job_id,
            mode = %request.mode,
            source = %request.source_path.display(),
            "Starting job"
        );

        let result = self.run_inner(&request, &reporter).await;

        let outcome = match result {
            Ok(Completion::Placed {
                final_path,
                hosted_url,
            }) => {
                reporter
                    .log(format!("Created {}", display_name(&final_path)))
                    .await;
                if let Some(url) = &hosted_url {
                    reporter.log(format!("Audio hosted at {}", url)).await;
                }
                JobOutcome::Succeeded {
                    final_path,
                    hosted_url,
                }
            }
            Ok(Completion::Declined) => {
                reporter
                    .log("Existing file kept; output discarded")
                    .await;
                JobOutcome::CancelledByUser
            }
            Err(e) => {
                let message = e.message();
                error!(job_id = %job_id, kind = e.kind(), "Job failed: {}", message);
                reporter.log(format!("Error: {}", message)).await;
                JobOutcome::Failed {
                    kind: e.kind().to_string(),
                    message,
                }
            }
        };

        metrics::JOBS_TOTAL
            .with_label_values(&[request.mode.as_str(), outcome.label()])
            .inc();
        metrics::JOB_DURATION
            .with_label_values(&[request.mode.as_str()])
            .observe(started.elapsed().as_secs_f64());

        reporter.state(outcome.final_state()).await;
        reporter.finished(outcome.clone()).await;
        outcome
    }

    async fn run_inner(
        &self,
        request: &JobRequest,
        reporter: &Reporter<'_>,
    ) -> Result<Completion, JobError> {
        reporter.state(JobState::Validating).await;
        let plan = self.validate(request).await?;

        let workspace = Workspace::create(self.settings.job.workspace_root.as_deref())?;
        let result = self.execute(request, plan, &workspace, reporter).await;
        if let Err(e) = workspace.close() {
            warn!("Failed to remove workspace: {}", e);
        }
        result
    }

    /// Fails fast on anything that makes the job pointless.
    async fn validate(&self, request: &JobRequest) -> Result<Plan, JobError> {
        let source = &request.source_path;
        match fs::metadata(source).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                return Err(JobError::precondition(format!(
                    "source file not found: {}",
                    source.display()
                )))
            }
        }

        let kind = classify(source);
        match request.mode {
            JobMode::Inject => {
                let audio_url = tag::extract(&display_name(source)).ok_or_else(|| {
                    JobError::precondition("file name has no [sound=URL] tag")
                })?;
                if !kind.is_visual() {
                    return Err(JobError::precondition(format!(
                        "inject needs a video or image source, got {}",
                        kind
                    )));
                }
                Ok(Plan::Inject { audio_url, kind })
            }
            JobMode::Extract => {
                if kind != AssetKind::Video {
                    return Err(JobError::precondition(format!(
                        "extract needs a video source, got {}",
                        kind
                    )));
                }
                if request.target_size_bytes == 0 {
                    return Err(JobError::precondition("target size must be positive"));
                }
                Ok(Plan::Extract)
            }
        }
    }

    async fn execute(
        &self,
        request: &JobRequest,
        plan: Plan,
        workspace: &Workspace,
        reporter: &Reporter<'_>,
    ) -> Result<Completion, JobError> {
        let staged = match plan {
            Plan::Inject { audio_url, kind } => {
                self.inject(request, &audio_url, kind, workspace, reporter)
                    .await?
            }
            Plan::Extract => self.extract(request, workspace, reporter).await?,
        };
        self.finalize(request, staged, reporter).await
    }

    async fn inject(
        &self,
        request: &JobRequest,
        audio_url: &str,
        kind: AssetKind,
        workspace: &Workspace,
        reporter: &Reporter<'_>,
    ) -> Result<Staged, JobError> {
        let container = request.container;

        reporter.state(JobState::Acquiring).await;
        reporter.log(format!("Downloading audio from {}", audio_url)).await;
        let download_path = workspace.file(&download_file_name(audio_url));
        let downloaded = self.fetcher.download(audio_url, &download_path).await?;
        metrics::DOWNLOADED_BYTES.inc_by(downloaded.size_bytes);
        debug!(
            size_bytes = downloaded.size_bytes,
            content_type = %downloaded.content_type,
            "Audio downloaded"
        );

        let codec = container.audio_codec();
        let audio_path = workspace.file(&format!("audio.{}", codec.extension()));
        reporter
            .log(format!("Converting audio to {}", codec.ffmpeg_codec()))
            .await;
        self.transcoder
            .audio_to_codec(&downloaded.path, &audio_path, codec)
            .await?;

        reporter.state(JobState::Transforming).await;
        let output = workspace.file(&format!("output.{}", container.extension()));
        match kind {
            AssetKind::Image => {
                reporter.log("Building video from still image").await;
                self.transcoder
                    .image_to_video(&request.source_path, &audio_path, &output, container)
                    .await?;
            }
            _ => {
                reporter.log("Muxing audio into video").await;
                self.transcoder
                    .mux(&request.source_path, &audio_path, &output, container)
                    .await?;
            }
        }

        Ok(Staged {
            path: output,
            hosted_url: None,
        })
    }

    async fn extract(
        &self,
        request: &JobRequest,
        workspace: &Workspace,
        reporter: &Reporter<'_>,
    ) -> Result<Staged, JobError> {
        let container = request.container;

        reporter.state(JobState::Acquiring).await;
        let source_ext = request
            .source_path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "bin".to_string());
        let source_copy = workspace.file(&format!("source.{}", source_ext));
        fs::copy(&request.source_path, &source_copy).await?;

        let codec = self.settings.job.extracted_audio;
        let extracted = workspace.file(&format!("extracted.{}", codec.extension()));
        reporter.log("Extracting audio track").await;
        let audio = self
            .transcoder
            .audio_to_codec(&source_copy, &extracted, codec)
            .await?;
        if audio.size_bytes < self.settings.min_audio_bytes {
            return Err(AcquireError::PayloadTooSmall {
                size: audio.size_bytes,
                min: self.settings.min_audio_bytes,
            }
            .into());
        }

        reporter.state(JobState::Transforming).await;
        reporter
            .log(format!("Uploading audio to {}", self.host.name()))
            .await;
        let hosted_url = match self.host.upload(&extracted).await {
            Ok(url) => {
                metrics::UPLOADS_TOTAL.with_label_values(&["success"]).inc();
                url
            }
            Err(e) => {
                metrics::UPLOADS_TOTAL.with_label_values(&["failure"]).inc();
                return Err(e.into());
            }
        };

        reporter.state(JobState::Targeting).await;
        reporter
            .log(format!(
                "Compressing video to at most {} bytes",
                request.target_size_bytes
            ))
            .await;
        let compressed = workspace.file(&format!("compressed.{}", container.extension()));
        let report = self
            .compressor
            .compress(&source_copy, &compressed, request.target_size_bytes, container)
            .await?;
        reporter
            .log(format!(
                "Video is {} bytes after {} pass(es)",
                report.size_bytes,
                report.attempts.len()
            ))
            .await;

        Ok(Staged {
            path: report.output_path,
            hosted_url: Some(hosted_url),
        })
    }

    async fn finalize(
        &self,
        request: &JobRequest,
        staged: Staged,
        reporter: &Reporter<'_>,
    ) -> Result<Completion, JobError> {
        reporter.state(JobState::Finalizing).await;
        let destination = destination_path(
            &request.source_path,
            request.mode,
            request.container,
            staged.hosted_url.as_deref(),
        );

        if fs::try_exists(&destination).await? && !reporter.confirm_overwrite(&destination).await {
            info!("Overwrite of {} declined", destination.display());
            return Ok(Completion::Declined);
        }

        place(&staged.path, &destination).await?;

        if !request.preserve_original && destination != request.source_path {
            match fs::remove_file(&request.source_path).await {
                Ok(()) => {
                    reporter
                        .log(format!(
                            "Removed original {}",
                            display_name(&request.source_path)
                        ))
                        .await
                }
                Err(e) => {
                    warn!(
                        "Failed to remove original {}: {}",
                        request.source_path.display(),
                        e
                    );
                    reporter
                        .log(format!("Could not remove original: {}", e))
                        .await;
                }
            }
        }

        Ok(Completion::Placed {
            final_path: destination,
            hosted_url: staged.hosted_url,
        })
    }
}

impl<E, F, H> JobRunner<E, F, H>
where
    E: MediaEncoder + 'static,
    F: AudioFetcher + 'static,
    H: AudioHost + 'static,
{
    /// Runs a job on its own task, off the caller's thread.
    pub fn spawn(
        self: Arc<Self>,
        request: JobRequest,
        events: mpsc::Sender<JobEvent>,
    ) -> JoinHandle<JobOutcome> {
        tokio::spawn(async move { self.run(request, events).await })
    }
}
