//! Error types for configuration, encoding and per-video processing.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration could not be loaded or failed validation.
///
/// Always fatal: nothing is processed once one of these is raised.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read job file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("job file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("job file: {0}")]
    Shape(String),
    #[error("video #{index}: {reason}")]
    Invalid { index: usize, reason: String },
    #[error("environment variable {var}: {reason}")]
    Env { var: &'static str, reason: String },
    #[error("unknown {kind} '{value}' (expected one of: {expected})")]
    UnknownVariant {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("{0}")]
    Conflict(String),
}

/// Raised by an [`Encoder`](crate::ports::encoder::Encoder) when the process
/// could not run to completion.
#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("failed to launch encoder: {0}")]
    Launch(#[from] io::Error),
    #[error("encoder did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("encode cancelled")]
    Cancelled,
}

/// A failure scoped to a single video. The runner logs it and moves on.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("cannot create output directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("encoding {video} failed: {reason}")]
    EncodeFailed {
        video: String,
        reason: String,
        diagnostics: String,
    },
    #[error("cannot write master playlist {path:?}: {source}")]
    PlaylistWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("encoding {video} was cancelled")]
    Cancelled { video: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_entry_names_its_index() {
        let err = ConfigError::Invalid {
            index: 3,
            reason: "missing field `resource`".to_string(),
        };
        assert_eq!(err.to_string(), "video #3: missing field `resource`");
    }

    #[test]
    fn encode_failure_message_carries_video_and_reason() {
        let err = JobError::EncodeFailed {
            video: "2024-09-06_11-35-17".to_string(),
            reason: "exit status: 1".to_string(),
            diagnostics: "No such file or directory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "encoding 2024-09-06_11-35-17 failed: exit status: 1"
        );
    }
}
