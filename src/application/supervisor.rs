//! Connection supervisor
//!
//! Runs client sessions in a loop. Each cycle reloads the stored
//! credentials, opens a fresh connection and builds a fresh
//! [`AutoResponder`] (with an empty call tracker), then dispatches events
//! until the connection closes. Any disconnect other than a logout starts
//! the next cycle right away.

use crate::application::pairing::PairingBoard;
use crate::application::responder::{AutoResponder, ResponderSettings};
use crate::domain::audio::AudioSource;
use crate::domain::messaging::{
    ClientEvent, ClientSession, ConnectError, ConnectionState, ConnectionUpdate, Connector,
    DisconnectReason,
};
use crate::domain::session::{SessionError, SessionStore};
use crate::infrastructure::media::render_terminal;
use crate::interface::api::metrics_handler::record_reconnect;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why one session could not be started
#[derive(Error, Debug)]
pub enum StartError {
    #[error("Failed to load session: {0}")]
    Session(#[from] SessionError),

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Startup failed: {0}")]
    Startup(#[source] StartError),

    #[error("Reconnect failed (cycle {cycle}): {source}")]
    Reconnect {
        cycle: u64,
        #[source]
        source: StartError,
    },
}

/// How supervision ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// The device was unlinked; credentials must be re-provisioned
    LoggedOut,
}

pub struct ConnectionSupervisor {
    connector: Arc<dyn Connector>,
    store: Arc<dyn SessionStore>,
    audio: Arc<dyn AudioSource>,
    settings: ResponderSettings,
    board: PairingBoard,
    terminal_qr: bool,
    preview_url: Option<String>,
}

impl ConnectionSupervisor {
    pub fn new(
        connector: Arc<dyn Connector>,
        store: Arc<dyn SessionStore>,
        audio: Arc<dyn AudioSource>,
        settings: ResponderSettings,
        board: PairingBoard,
    ) -> Self {
        Self {
            connector,
            store,
            audio,
            settings,
            board,
            terminal_qr: true,
            preview_url: None,
        }
    }

    /// Print new pairing codes as a QR in the terminal (on by default)
    pub fn with_terminal_qr(mut self, enabled: bool) -> Self {
        self.terminal_qr = enabled;
        self
    }

    /// Mention where the HTTP preview of the pairing code can be opened
    pub fn with_preview_url(mut self, url: impl Into<String>) -> Self {
        self.preview_url = Some(url.into());
        self
    }

    pub fn board(&self) -> &PairingBoard {
        &self.board
    }

    /// Supervise sessions until logout or a failed (re)start
    pub async fn run(&self) -> Result<SupervisorExit, SupervisorError> {
        let mut cycle: u64 = 0;

        loop {
            cycle += 1;
            match self.run_session(cycle).await {
                Ok(reason) if reason.should_reconnect() => {
                    record_reconnect();
                    info!(cycle, "Restarting session after disconnect: {}", reason);
                }
                Ok(_) => {
                    warn!("Logged out. Delete the session directory and pair the device again");
                    return Ok(SupervisorExit::LoggedOut);
                }
                Err(e) if cycle == 1 => {
                    error!("Failed to start: {}", e);
                    return Err(SupervisorError::Startup(e));
                }
                Err(e) => {
                    error!("Reconnect failed: {}", e);
                    return Err(SupervisorError::Reconnect { cycle, source: e });
                }
            }
        }
    }

    /// One connection from startup to disconnect
    async fn run_session(&self, cycle: u64) -> Result<DisconnectReason, StartError> {
        let credentials = self.store.load().await?;
        debug!(cycle, paired = credentials.is_some(), "Starting session");

        let ClientSession { client, mut events } = self.connector.connect(credentials).await?;
        self.board.set_connection(ConnectionState::Connecting).await;

        let responder = AutoResponder::new(client, self.audio.clone(), self.settings.clone());

        while let Some(event) = events.recv().await {
            match event {
                ClientEvent::ConnectionUpdate(update) => {
                    if let Some(reason) = self.on_connection_update(update).await {
                        return Ok(reason);
                    }
                }
                ClientEvent::CredentialsUpdate(credentials) => {
                    if let Err(e) = self.store.save(&credentials).await {
                        error!(error = %e, "Failed to save credentials");
                    }
                }
                ClientEvent::Call(batch) => {
                    if let Some(record) = responder.dispatch(&batch) {
                        responder.spawn_response(record);
                    }
                }
                ClientEvent::CallsUpsert(calls) => {
                    debug!(
                        "Calls upsert event: {}",
                        serde_json::to_string(&calls).unwrap_or_default()
                    );
                }
            }
        }

        // Event stream ended without a close notice
        self.board.set_connection(ConnectionState::Close).await;
        Ok(DisconnectReason::ConnectionLost)
    }

    /// Returns the disconnect reason when the update closes the session
    async fn on_connection_update(&self, update: ConnectionUpdate) -> Option<DisconnectReason> {
        if let Some(code) = update.pairing_code {
            self.show_pairing_code(code).await;
        }

        match update.connection {
            Some(ConnectionState::Close) => {
                let reason = update
                    .disconnect_reason
                    .unwrap_or(DisconnectReason::ConnectionLost);
                self.board.set_connection(ConnectionState::Close).await;
                warn!(
                    "Disconnected ({}). Reconnecting? {}",
                    reason,
                    reason.should_reconnect()
                );
                Some(reason)
            }
            Some(ConnectionState::Open) => {
                self.board.set_connection(ConnectionState::Open).await;
                info!("Connected to the messaging platform");
                None
            }
            Some(ConnectionState::Connecting) => {
                self.board.set_connection(ConnectionState::Connecting).await;
                None
            }
            None => None,
        }
    }

    async fn show_pairing_code(&self, code: String) {
        info!("Scan this QR code with the app (Linked Devices > Link a Device)");
        if self.terminal_qr {
            match render_terminal(&code) {
                Ok(art) => println!("{}", art),
                Err(e) => warn!(error = %e, "Cannot render pairing code in terminal"),
            }
        }
        if let Some(url) = &self.preview_url {
            info!("Also available at: {}", url);
        }
        self.board.publish_code(code).await;
    }
}
