//! JSON frames exchanged with the gateway

use crate::domain::call::{CallEvent, CallStatus};
use crate::domain::messaging::{
    ClientEvent, ConnectionState, ConnectionUpdate, DisconnectReason, MessagePayload,
};
use crate::domain::session::Credentials;
use crate::domain::shared::value_objects::{CallId, PeerId};
use crate::domain::DomainError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Frames sent to the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    Hello {
        credentials: Option<serde_json::Value>,
    },
    Send {
        request_id: Uuid,
        to: String,
        payload: WirePayload,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WirePayload {
    Text {
        text: String,
    },
    Audio {
        /// Base64 (standard alphabet) clip bytes
        data: String,
        mimetype: String,
        ptt: bool,
    },
}

impl From<&MessagePayload> for WirePayload {
    fn from(payload: &MessagePayload) -> Self {
        match payload {
            MessagePayload::Text { text } => WirePayload::Text { text: text.clone() },
            MessagePayload::Audio {
                data,
                mimetype,
                push_to_talk,
            } => WirePayload::Audio {
                data: BASE64.encode(data),
                mimetype: mimetype.clone(),
                ptt: *push_to_talk,
            },
        }
    }
}

/// Frames received from the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    ConnectionUpdate {
        connection: Option<String>,
        qr: Option<String>,
        status_code: Option<u16>,
    },
    CredsUpdate {
        credentials: serde_json::Value,
    },
    Call {
        calls: Vec<WireCall>,
    },
    CallsUpsert {
        calls: Vec<WireCall>,
    },
    SendResult {
        request_id: Uuid,
        ok: bool,
        error: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCall {
    pub id: String,
    pub from: String,
    pub status: Option<String>,
}

impl TryFrom<WireCall> for CallEvent {
    type Error = DomainError;

    fn try_from(call: WireCall) -> Result<Self, Self::Error> {
        let id = CallId::parse(&call.id)
            .map_err(|e| DomainError::InvalidCallEvent(e.to_string()))?;
        let from = PeerId::parse(&call.from)
            .map_err(|e| DomainError::InvalidCallEvent(format!("call {}: {}", id, e)))?;
        let status = call
            .status
            .map(CallStatus::from)
            .unwrap_or_else(|| CallStatus::Other("unknown".to_string()));

        Ok(CallEvent { id, from, status })
    }
}

fn convert_calls(calls: Vec<WireCall>) -> Vec<CallEvent> {
    calls
        .into_iter()
        .filter_map(|call| match CallEvent::try_from(call) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "Dropping malformed call event");
                None
            }
        })
        .collect()
}

/// Keeps the batch order; a malformed first entry drops the whole batch
fn convert_call_batch(calls: Vec<WireCall>) -> Vec<CallEvent> {
    let mut calls = calls.into_iter();
    let Some(first) = calls.next() else {
        return Vec::new();
    };

    match CallEvent::try_from(first) {
        Ok(event) => std::iter::once(event)
            .chain(convert_calls(calls.collect()))
            .collect(),
        Err(e) => {
            warn!(
                error = %e,
                ignored = calls.len(),
                "Dropping call batch with a malformed first event"
            );
            Vec::new()
        }
    }
}

fn parse_connection(raw: &str) -> Option<ConnectionState> {
    match raw {
        "connecting" => Some(ConnectionState::Connecting),
        "open" => Some(ConnectionState::Open),
        "close" => Some(ConnectionState::Close),
        other => {
            warn!("Unknown connection state from gateway: {}", other);
            None
        }
    }
}

impl Inbound {
    /// Client event carried by this frame; `None` for send results
    pub fn into_event(self) -> Option<ClientEvent> {
        match self {
            Inbound::ConnectionUpdate {
                connection,
                qr,
                status_code,
            } => {
                let connection = connection.as_deref().and_then(parse_connection);
                let disconnect_reason = (connection == Some(ConnectionState::Close))
                    .then(|| DisconnectReason::from_status_code(status_code));
                Some(ClientEvent::ConnectionUpdate(ConnectionUpdate {
                    connection,
                    disconnect_reason,
                    pairing_code: qr,
                }))
            }
            Inbound::CredsUpdate { credentials } => {
                Some(ClientEvent::CredentialsUpdate(Credentials(credentials)))
            }
            Inbound::Call { calls } => Some(ClientEvent::Call(convert_call_batch(calls))),
            Inbound::CallsUpsert { calls } => Some(ClientEvent::CallsUpsert(convert_calls(calls))),
            Inbound::SendResult { .. } => None,
        }
    }
}
