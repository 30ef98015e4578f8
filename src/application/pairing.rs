//! Latest pairing code and connection status, shared with the HTTP surface

use crate::domain::messaging::ConnectionState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Point-in-time view of the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairingSnapshot {
    pub pairing_code: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub connection: Option<String>,
}

#[derive(Debug, Default)]
struct BoardState {
    code: Option<(String, DateTime<Utc>)>,
    connection: Option<ConnectionState>,
}

/// Holds only the newest pairing code; every new code replaces the old one
#[derive(Debug, Clone, Default)]
pub struct PairingBoard {
    state: Arc<RwLock<BoardState>>,
}

impl PairingBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish_code(&self, code: impl Into<String>) {
        let mut state = self.state.write().await;
        state.code = Some((code.into(), Utc::now()));
    }

    pub async fn latest_code(&self) -> Option<String> {
        self.state.read().await.code.as_ref().map(|(code, _)| code.clone())
    }

    pub async fn set_connection(&self, connection: ConnectionState) {
        self.state.write().await.connection = Some(connection);
    }

    pub async fn connection(&self) -> Option<ConnectionState> {
        self.state.read().await.connection
    }

    pub async fn snapshot(&self) -> PairingSnapshot {
        let state = self.state.read().await;
        PairingSnapshot {
            pairing_code: state.code.as_ref().map(|(code, _)| code.clone()),
            issued_at: state.code.as_ref().map(|(_, at)| *at),
            connection: state.connection.map(|c| c.as_str().to_string()),
        }
    }
}
