//! Domain layer - Pure planning logic, no I/O.

pub mod command;
pub mod hls;
pub mod jobs;
pub mod ladder;
pub mod output;
pub mod video;
