//! Messaging port: the client library as seen by the auto-responder
//!
//! The platform protocol, its encryption and multi-device sync live behind
//! this trait. Infrastructure provides the adapter.

use crate::domain::call::CallEvent;
use crate::domain::session::Credentials;
use crate::domain::shared::value_objects::PeerId;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Message body handed to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePayload {
    /// Audio message; `push_to_talk` makes it render as a voice note
    Audio {
        data: Bytes,
        mimetype: String,
        push_to_talk: bool,
    },
    Text { text: String },
}

impl MessagePayload {
    pub fn voice_note(data: Bytes, mimetype: impl Into<String>) -> Self {
        MessagePayload::Audio {
            data,
            mimetype: mimetype.into(),
            push_to_talk: true,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        MessagePayload::Text { text: text.into() }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            MessagePayload::Audio { .. } => MessageKind::Audio,
            MessagePayload::Text { .. } => MessageKind::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Audio,
    Text,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Audio => "audio",
            MessageKind::Text => "text",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a send did not go through
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("Not connected")]
    NotConnected,

    #[error("Send rejected: {0}")]
    Rejected(String),

    #[error("Send timed out after {0} ms")]
    Timeout(u64),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Outbound side of the messaging client
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Deliver one message to `to`
    async fn send_message(&self, to: &PeerId, payload: MessagePayload) -> Result<(), SendError>;
}

/// Connection lifecycle as reported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connecting,
    Open,
    Close,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Close => "close",
        }
    }
}

/// Platform status code meaning the linked device was removed
pub const LOGGED_OUT_STATUS: u16 = 401;

/// Why a connection closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Credentials are no longer valid; pair again
    LoggedOut,
    /// The transport went away without a close notice
    ConnectionLost,
    /// Any other platform status code
    Status(u16),
}

impl DisconnectReason {
    pub fn from_status_code(code: Option<u16>) -> Self {
        match code {
            Some(LOGGED_OUT_STATUS) => DisconnectReason::LoggedOut,
            Some(code) => DisconnectReason::Status(code),
            None => DisconnectReason::ConnectionLost,
        }
    }

    pub fn should_reconnect(&self) -> bool {
        !matches!(self, DisconnectReason::LoggedOut)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::LoggedOut => write!(f, "logged out"),
            DisconnectReason::ConnectionLost => write!(f, "connection lost"),
            DisconnectReason::Status(code) => write!(f, "status {}", code),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionUpdate {
    pub connection: Option<ConnectionState>,
    pub disconnect_reason: Option<DisconnectReason>,
    /// New pairing (QR) payload, if one was issued
    pub pairing_code: Option<String>,
}

/// Events emitted by the client, in platform order
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    ConnectionUpdate(ConnectionUpdate),
    CredentialsUpdate(Credentials),
    Call(Vec<CallEvent>),
    CallsUpsert(Vec<CallEvent>),
}

/// A live client connection and the events it will emit
pub struct ClientSession {
    pub client: Arc<dyn MessagingClient>,
    pub events: mpsc::Receiver<ClientEvent>,
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Failed to connect: {0}")]
    Failed(String),
}

/// Opens a fresh client session from (possibly absent) stored credentials
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, credentials: Option<Credentials>) -> Result<ClientSession, ConnectError>;
}
