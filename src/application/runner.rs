use crate::config::RunSettings;
use crate::domain::command::{build_encode_parameters, EncodePlan};
use crate::domain::hls::compose_master;
use crate::domain::jobs::{RunSummary, VideoOutcome};
use crate::domain::ladder::RenditionLadder;
use crate::domain::video::{PathResolver, VideoDescriptor};
use crate::error::{EncoderError, JobError};
use crate::ports::encoder::Encoder;
use crate::ports::storage::OutputStore;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lines of encoder stderr kept with a failure.
const DIAGNOSTIC_LINES: usize = 20;

/// Processes videos one at a time. A failing video is logged and skipped;
/// the run always moves on to the next one.
pub struct JobRunner<E, S> {
    encoder: E,
    store: S,
    ladder: RenditionLadder,
    resolver: PathResolver,
    dry_run: bool,
}

impl<E, S> JobRunner<E, S>
where
    E: Encoder,
    S: OutputStore,
{
    pub fn new(
        encoder: E,
        store: S,
        ladder: RenditionLadder,
        resolver: PathResolver,
        dry_run: bool,
    ) -> Self {
        Self {
            encoder,
            store,
            ladder,
            resolver,
            dry_run,
        }
    }

    pub fn from_settings(encoder: E, store: S, settings: &RunSettings) -> Self {
        Self::new(
            encoder,
            store,
            settings.ladder.clone(),
            settings.resolver,
            settings.dry_run,
        )
    }

    pub async fn run(&self, videos: &[VideoDescriptor], cancel: &CancellationToken) -> RunSummary {
        let mut summary = RunSummary::default();

        for (i, video) in videos.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.push(VideoOutcome::Skipped {
                    video: video.id().to_string(),
                });
                continue;
            }
            info!(video = video.id(), "[{}/{}] processing", i + 1, videos.len());

            let outcome = if self.dry_run {
                self.plan_only(video)
            } else {
                match self.process(video, cancel).await {
                    Ok(master) => {
                        info!(video = video.id(), master = %master, "master playlist created");
                        VideoOutcome::Processed {
                            video: video.id().to_string(),
                            master,
                        }
                    }
                    Err(JobError::Cancelled { .. }) => {
                        warn!(video = video.id(), "encode cancelled");
                        VideoOutcome::Skipped {
                            video: video.id().to_string(),
                        }
                    }
                    Err(e) => {
                        error!(video = video.id(), "error processing video: {}", e);
                        if let JobError::EncodeFailed { diagnostics, .. } = &e {
                            if !diagnostics.is_empty() {
                                error!(video = video.id(), "encoder output:\n{}", diagnostics);
                            }
                        }
                        VideoOutcome::Failed {
                            video: video.id().to_string(),
                            error: e.to_string(),
                        }
                    }
                }
            };
            summary.push(outcome);
        }

        info!(
            processed = summary.processed().count(),
            planned = summary.count_planned(),
            failed = summary.failed().count(),
            skipped = summary.count_skipped(),
            "run finished"
        );
        summary
    }

    pub fn plan(&self, video: &VideoDescriptor) -> EncodePlan {
        build_encode_parameters(
            &self.resolver.input_resource(video),
            &self.resolver.output_root(video),
            &self.ladder,
        )
    }

    fn plan_only(&self, video: &VideoDescriptor) -> VideoOutcome {
        let plan = self.plan(video);
        match serde_json::to_string(video) {
            Ok(json) => info!(video = video.id(), "dry run, descriptor: {}", json),
            Err(e) => warn!(video = video.id(), "cannot render descriptor: {}", e),
        }
        info!(video = video.id(), "dry run, encoder arguments: {}", plan);
        VideoOutcome::Planned {
            video: video.id().to_string(),
            command: plan.to_string(),
        }
    }

    /// Encode one video and write its master playlist. Returns the master path.
    pub async fn process(
        &self,
        video: &VideoDescriptor,
        cancel: &CancellationToken,
    ) -> Result<String, JobError> {
        let root = self.resolver.output_root(video);
        self.store
            .ensure_dir(Path::new(&root))
            .await
            .map_err(|source| JobError::Directory {
                path: root.clone().into(),
                source,
            })?;

        let plan = self.plan(video);
        info!(
            video = video.id(),
            input = %plan.input,
            renditions = plan.outputs.len(),
            "running encoder"
        );
        debug!(video = video.id(), "encoder arguments: {}", plan);

        let output = self
            .encoder
            .encode(&plan, cancel)
            .await
            .map_err(|e| match e {
                EncoderError::Cancelled => JobError::Cancelled {
                    video: video.id().to_string(),
                },
                other => JobError::EncodeFailed {
                    video: video.id().to_string(),
                    reason: other.to_string(),
                    diagnostics: String::new(),
                },
            })?;

        if !output.success {
            let reason = match output.exit_code {
                Some(code) => format!("encoder exited with status {}", code),
                None => "encoder terminated by signal".to_string(),
            };
            return Err(JobError::EncodeFailed {
                video: video.id().to_string(),
                reason,
                diagnostics: tail(&output.stderr, DIAGNOSTIC_LINES),
            });
        }
        if !output.stdout.trim().is_empty() {
            debug!(video = video.id(), "encoder stdout: {}", output.stdout.trim());
        }

        let master = self.resolver.master_path(video);
        let text = compose_master(&self.ladder, &self.resolver.uri_style(video));
        self.store
            .write_file(Path::new(&master), &text)
            .await
            .map_err(|source| JobError::PlaylistWrite {
                path: master.clone().into(),
                source,
            })?;

        Ok(master)
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim_end().lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
