//! WebSocket client for the messaging gateway

use super::error::GatewayError;
use super::protocol::{Inbound, Outbound, WirePayload};
use crate::domain::messaging::{
    ClientEvent, ClientSession, ConnectError, ConnectionState, ConnectionUpdate, Connector,
    DisconnectReason, MessagePayload, MessagingClient, SendError,
};
use crate::domain::session::Credentials;
use crate::domain::shared::value_objects::PeerId;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SendReply = oneshot::Sender<Result<(), SendError>>;

#[derive(Default)]
struct PendingState {
    replies: HashMap<Uuid, SendReply>,
    closed: bool,
}

/// Sends awaiting a `send_result` frame, by request id
///
/// Once closed (the reader stopped) no new send can register.
#[derive(Clone, Default)]
struct PendingSends {
    inner: Arc<Mutex<PendingState>>,
}

impl PendingSends {
    fn state(&self) -> MutexGuard<'_, PendingState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `false` when the reader has already stopped
    fn insert(&self, request_id: Uuid, reply: SendReply) -> bool {
        let mut state = self.state();
        if state.closed {
            return false;
        }
        state.replies.insert(request_id, reply);
        true
    }

    fn forget(&self, request_id: &Uuid) {
        self.state().replies.remove(request_id);
    }

    fn resolve(&self, request_id: Uuid, result: Result<(), SendError>) {
        match self.state().replies.remove(&request_id) {
            Some(reply) => {
                let _ = reply.send(result);
            }
            None => debug!(%request_id, "Send result for unknown or expired request"),
        }
    }

    /// Fail every waiting send and refuse new ones
    fn close(&self) {
        let mut state = self.state();
        state.closed = true;
        for (_, reply) in state.replies.drain() {
            let _ = reply.send(Err(SendError::NotConnected));
        }
    }
}

/// Outbound half of a gateway session
pub struct GatewayClient {
    writer: tokio::sync::Mutex<SplitSink<WsStream, Message>>,
    pending: PendingSends,
    connected: Arc<AtomicBool>,
    send_timeout: Duration,
}

impl GatewayClient {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingClient for GatewayClient {
    async fn send_message(&self, to: &PeerId, payload: MessagePayload) -> Result<(), SendError> {
        if !self.is_connected() {
            return Err(SendError::NotConnected);
        }

        let request_id = Uuid::new_v4();
        let frame = Outbound::Send {
            request_id,
            to: to.as_str().to_string(),
            payload: WirePayload::from(&payload),
        };
        let text = serde_json::to_string(&frame).map_err(|e| SendError::Transport(e.to_string()))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        if !self.pending.insert(request_id, reply_tx) {
            return Err(SendError::NotConnected);
        }

        if let Err(e) = self.writer.lock().await.send(Message::Text(text.into())).await {
            self.pending.forget(&request_id);
            return Err(SendError::Transport(e.to_string()));
        }

        match tokio::time::timeout(self.send_timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SendError::NotConnected),
            Err(_) => {
                self.pending.forget(&request_id);
                Err(SendError::Timeout(self.send_timeout.as_millis() as u64))
            }
        }
    }
}

/// Opens gateway sessions for the connection supervisor
#[derive(Debug, Clone)]
pub struct GatewayConnector {
    url: String,
    send_timeout: Duration,
    event_buffer: usize,
}

impl GatewayConnector {
    pub fn new(url: impl Into<String>, send_timeout: Duration, event_buffer: usize) -> Self {
        Self {
            url: url.into(),
            send_timeout,
            event_buffer: event_buffer.max(1),
        }
    }

    pub fn from_config(config: &crate::config::GatewayConfig) -> Self {
        Self::new(
            config.url.clone(),
            Duration::from_millis(config.send_timeout_ms),
            config.event_buffer,
        )
    }

    async fn open(&self, credentials: Option<Credentials>) -> Result<ClientSession, GatewayError> {
        let (ws, _response) = connect_async(self.url.as_str()).await?;
        let (mut writer, reader) = ws.split();

        let hello = Outbound::Hello {
            credentials: credentials.map(Credentials::into_inner),
        };
        writer
            .send(Message::Text(serde_json::to_string(&hello)?.into()))
            .await?;
        info!("Connected to messaging gateway at {}", self.url);

        let (events_tx, events_rx) = mpsc::channel(self.event_buffer);
        let pending = PendingSends::default();
        let connected = Arc::new(AtomicBool::new(true));

        tokio::spawn(read_loop(
            reader,
            events_tx,
            pending.clone(),
            connected.clone(),
        ));

        let client = GatewayClient {
            writer: tokio::sync::Mutex::new(writer),
            pending,
            connected,
            send_timeout: self.send_timeout,
        };

        Ok(ClientSession {
            client: Arc::new(client),
            events: events_rx,
        })
    }
}

#[async_trait]
impl Connector for GatewayConnector {
    async fn connect(&self, credentials: Option<Credentials>) -> Result<ClientSession, ConnectError> {
        Ok(self.open(credentials).await?)
    }
}

/// Pump gateway frames into the event channel until either side goes away
async fn read_loop(
    mut reader: SplitStream<WsStream>,
    events: mpsc::Sender<ClientEvent>,
    pending: PendingSends,
    connected: Arc<AtomicBool>,
) {
    let mut saw_close = false;

    while let Some(frame) = reader.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(frame)) => {
                debug!(?frame, "Gateway closed the socket");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "Gateway socket error");
                break;
            }
        };

        let inbound: Inbound = match serde_json::from_str(&text) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed gateway frame");
                continue;
            }
        };

        if let Inbound::SendResult {
            request_id,
            ok,
            error,
        } = inbound
        {
            let result = if ok {
                Ok(())
            } else {
                Err(SendError::Rejected(
                    error.unwrap_or_else(|| "rejected by gateway".to_string()),
                ))
            };
            pending.resolve(request_id, result);
            continue;
        }

        let Some(event) = inbound.into_event() else {
            continue;
        };
        if let ClientEvent::ConnectionUpdate(update) = &event {
            saw_close |= update.connection == Some(ConnectionState::Close);
        }
        if events.send(event).await.is_err() {
            debug!("Event receiver dropped, stopping gateway reader");
            break;
        }
    }

    connected.store(false, Ordering::SeqCst);
    pending.close();

    if !saw_close {
        let lost = ClientEvent::ConnectionUpdate(ConnectionUpdate {
            connection: Some(ConnectionState::Close),
            disconnect_reason: Some(DisconnectReason::ConnectionLost),
            pairing_code: None,
        });
        let _ = events.send(lost).await;
    }
}
