use crate::domain::command::EncodePlan;
use crate::error::EncoderError;
use crate::ports::encoder::{EncodeOutput, Encoder};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs plans through an `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// First line of `ffmpeg -version`.
    pub async fn version(&self) -> std::io::Result<String> {
        let output = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or("unknown").to_string())
    }

    fn command(&self, plan: &EncodePlan) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(plan.to_args())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }

    async fn run(&self, mut command: Command) -> Result<Output, EncoderError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| EncoderError::TimedOut(limit))?
                .map_err(EncoderError::Launch),
            None => command.output().await.map_err(EncoderError::Launch),
        }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(
        &self,
        plan: &EncodePlan,
        cancel: &CancellationToken,
    ) -> Result<EncodeOutput, EncoderError> {
        debug!(program = %self.program.display(), "spawning encoder");
        let command = self.command(plan);

        // Dropping the pending output future kills the child.
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EncoderError::Cancelled),
            result = self.run(command) => result?,
        };

        Ok(EncodeOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
