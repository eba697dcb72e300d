//! Application layer - Services generic over the ports.

pub mod runner;

pub use runner::JobRunner;
