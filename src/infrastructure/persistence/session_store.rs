//! File-backed session credentials

use crate::domain::session::{Credentials, SessionError, SessionStore};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CREDS_FILE: &str = "creds.json";

/// Stores credentials as `<auth_dir>/creds.json`
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn creds_path(&self) -> PathBuf {
        self.dir.join(CREDS_FILE)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Credentials>, SessionError> {
        let path = self.creds_path();
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No stored session at {}, a new pairing is required", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let credentials: Credentials = serde_json::from_slice(&raw)?;
        debug!("Loaded session from {}", path.display());
        Ok(Some(credentials))
    }

    async fn save(&self, credentials: &Credentials) -> Result<(), SessionError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.creds_path();
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(credentials)?;

        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("Saved session to {}", path.display());
        Ok(())
    }
}
