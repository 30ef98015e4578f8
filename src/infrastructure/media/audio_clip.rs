//! Auto-response clip stored on the local file system

use crate::domain::audio::AudioSource;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads the clip from disk on every `load`, so it can be swapped at runtime
#[derive(Debug, Clone)]
pub struct FileAudioSource {
    path: PathBuf,
}

impl FileAudioSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AudioSource for FileAudioSource {
    async fn load(&self) -> io::Result<Option<Bytes>> {
        match tokio::fs::read(&self.path).await {
            Ok(data) => {
                debug!("Loaded {} bytes from {}", data.len(), self.path.display());
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_clip_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileAudioSource::new(dir.path().join("auto_response.mp3"));
        assert_eq!(source.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clip_read_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto_response.mp3");
        let source = FileAudioSource::new(&path);
        assert_eq!(source.load().await.unwrap(), None);

        tokio::fs::write(&path, b"ID3\x03clip").await.unwrap();
        assert_eq!(
            source.load().await.unwrap(),
            Some(Bytes::from_static(b"ID3\x03clip"))
        );
        assert!(source.describe().ends_with("auto_response.mp3"));
    }
}
