use crate::ports::storage::OutputStore;
use async_trait::async_trait;
use std::io;
use std::path::Path;

#[derive(Clone, Copy, Default)]
pub struct FsAdapter;

impl FsAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OutputStore for FsAdapter {
    async fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn write_file(&self, path: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        // Write beside the target and rename so a reader never sees half a playlist.
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        tokio::fs::write(&staging, contents).await?;
        tokio::fs::rename(&staging, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn ensure_dir_is_idempotent() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("processed").join("video");
        let fs = FsAdapter::new();

        fs.ensure_dir(&nested).await.unwrap();
        fs.ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn write_file_overwrites_instead_of_appending() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.m3u8");
        let fs = FsAdapter::new();

        fs.write_file(&path, "#EXTM3U\nold").await.unwrap();
        fs.write_file(&path, "#EXTM3U\nnew").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "#EXTM3U\nnew");
        assert!(!dir.path().join("index.m3u8.tmp").exists());
    }

    #[tokio::test]
    async fn ensure_dir_fails_when_a_file_is_in_the_way() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let result = FsAdapter::new().ensure_dir(&blocker.join("video")).await;
        assert!(result.is_err());
    }
}
