//! Gateway adapter errors

use crate::domain::messaging::ConnectError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Malformed frame: {0}")]
    Protocol(#[from] serde_json::Error),
}

impl From<GatewayError> for ConnectError {
    fn from(err: GatewayError) -> Self {
        ConnectError::Failed(err.to_string())
    }
}
