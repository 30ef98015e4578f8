use call_autoreply::application::{
    ConnectionSupervisor, PairingBoard, ResponderSettings, SupervisorExit,
};
use call_autoreply::config::Config;
use call_autoreply::infrastructure::gateway::GatewayConnector;
use call_autoreply::infrastructure::media::FileAudioSource;
use call_autoreply::infrastructure::persistence::FileSessionStore;
use call_autoreply::interface::api::{build_router, init_metrics};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting call auto-responder");
    info!("Configuration loaded: {:?}", config);

    let board = PairingBoard::new();

    // Pairing preview and metrics server
    let api_server_handle = if config.server.enabled {
        let prometheus_handle = init_metrics()?;
        info!("Prometheus metrics initialized");

        let app = build_router(board.clone(), prometheus_handle);
        let listener =
            tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
                .await?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("HTTP server failed: {}", e);
            }
        });

        info!(
            "HTTP server started on {}:{}",
            config.server.host, config.server.port
        );
        Some(handle)
    } else {
        None
    };

    let connector = Arc::new(GatewayConnector::from_config(&config.gateway));
    let store = Arc::new(FileSessionStore::new(&config.session.auth_dir));
    let audio = Arc::new(FileAudioSource::new(&config.responder.audio_path));
    info!("Auto-response audio: {}", config.responder.audio_path);

    let mut supervisor = ConnectionSupervisor::new(
        connector,
        store,
        audio,
        ResponderSettings::from(&config.responder),
        board,
    );
    if config.server.enabled {
        supervisor =
            supervisor.with_preview_url(format!("http://localhost:{}", config.server.port));
    }

    let outcome = tokio::select! {
        result = supervisor.run() => Some(result),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutting down...");
            None
        }
    };

    if let Some(handle) = api_server_handle {
        handle.abort();
    }

    match outcome {
        Some(Ok(SupervisorExit::LoggedOut)) => {
            warn!("Session ended by logout");
            Ok(())
        }
        Some(Err(e)) => {
            error!("Supervisor stopped: {}", e);
            Err(e.into())
        }
        None => {
            info!("Shutdown complete");
            Ok(())
        }
    }
}
