use async_trait::async_trait;
use std::io;
use std::path::Path;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutputStore: Send + Sync {
    /// Create a directory and its parents. Existing directories are fine.
    async fn ensure_dir(&self, path: &Path) -> io::Result<()>;

    /// Write `contents` to `path`, replacing any previous file.
    async fn write_file(&self, path: &Path, contents: &str) -> io::Result<()>;
}
