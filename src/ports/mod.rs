//! Ports - Traits at the process and filesystem seams.

pub mod encoder;
pub mod storage;
