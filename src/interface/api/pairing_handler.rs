//! Pairing preview handlers
//!
//! No authentication: anyone who can reach the port can link a device while
//! a pairing code is on display. Bind to a trusted interface.

use crate::application::pairing::PairingBoard;
use crate::domain::messaging::ConnectionState;
use crate::infrastructure::media::render_png;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub connection: Option<String>,
    pub has_pairing_code: bool,
}

/// Human-readable status page
pub async fn status_page(State(board): State<PairingBoard>) -> Html<String> {
    if board.connection().await == Some(ConnectionState::Open) {
        return Html("<h2>✅ Connected</h2><p>The device is linked and listening for calls.</p>".to_string());
    }

    match board.latest_code().await {
        None => Html("QR not generated yet. Please wait...".to_string()),
        Some(_) => Html(
            "<h2>📱 Scan this QR Code with WhatsApp</h2>\n<img src=\"/qr\" alt=\"QR Code\" />"
                .to_string(),
        ),
    }
}

/// Latest pairing code as a PNG
pub async fn qr_image(State(board): State<PairingBoard>) -> Response {
    let Some(code) = board.latest_code().await else {
        return (StatusCode::NOT_FOUND, "No QR code available").into_response();
    };

    match render_png(&code) {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render pairing code");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate QR image").into_response()
        }
    }
}

/// Health check
pub async fn health_check(State(board): State<PairingBoard>) -> Json<HealthResponse> {
    let snapshot = board.snapshot().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        connection: snapshot.connection,
        has_pairing_code: snapshot.pairing_code.is_some(),
    })
}
