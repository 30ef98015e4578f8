//! Session port: durable credential storage

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque credential blob owned by the client library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(pub serde_json::Value);

impl Credentials {
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Load-at-startup, save-on-update credential storage
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stored credentials, or `None` when the device has never been paired
    async fn load(&self) -> Result<Option<Credentials>, SessionError>;

    async fn save(&self, credentials: &Credentials) -> Result<(), SessionError>;
}
