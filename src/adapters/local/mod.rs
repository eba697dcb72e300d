//! Local adapters: the host filesystem and an `ffmpeg` child process.

pub mod ffmpeg;
pub mod fs;

pub use ffmpeg::FfmpegEncoder;
pub use fs::FsAdapter;
