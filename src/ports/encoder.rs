use crate::domain::command::EncodePlan;
use crate::error::EncoderError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Captured result of an encoder process that ran to exit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Run one plan to completion.
    /// Returns `Err` only when the process could not run or was stopped;
    /// a non-zero exit is reported through [`EncodeOutput::success`].
    async fn encode(
        &self,
        plan: &EncodePlan,
        cancel: &CancellationToken,
    ) -> Result<EncodeOutput, EncoderError>;
}
