//! vodladder - Batch HLS rendition builder
//!
//! Turns source videos into an adaptive-bitrate HLS ladder (several
//! resolutions plus audio-only) with one encoder call per video, then
//! writes a master playlist referencing the renditions.
//!
//! Hexagonal Architecture:
//! - domain/: Pure planning logic (paths, ladder, encoder arguments, playlists)
//! - ports/: Trait definitions for the encoder and the output store
//! - adapters/: Concrete implementations (ffmpeg process, local filesystem)
//! - application/: The sequential job runner
//! - config: Environment defaults and job file loading

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use application::JobRunner;
pub use config::{BatchConfig, JobFile, Overrides, RunSettings};
pub use domain::command::{build_encode_parameters, EncodePlan};
pub use domain::hls::{compose_master, UriStyle};
pub use domain::ladder::{Profile, Rendition, RenditionLadder};
pub use domain::video::{Layout, MasterPlacement, PathResolver, VideoDescriptor};
pub use error::{ConfigError, EncoderError, JobError};
