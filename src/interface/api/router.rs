//! API Router configuration

use super::metrics_handler::metrics_handler;
use super::pairing_handler::{health_check, qr_image, status_page};
use crate::application::pairing::PairingBoard;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

/// Build the API router
pub fn build_router(board: PairingBoard, prometheus_handle: PrometheusHandle) -> Router {
    let pairing_routes = Router::new()
        .route("/", get(status_page))
        .route("/qr", get(qr_image))
        .route("/health", get(health_check))
        .with_state(board);

    // Metrics route (separate state)
    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    Router::new()
        .merge(pairing_routes)
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::messaging::ConnectionState;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn router(board: &PairingBoard) -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        build_router(board.clone(), handle)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn test_index_waits_for_code() {
        let board = PairingBoard::new();
        let response = router(&board)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "QR not generated yet. Please wait...");
    }

    #[tokio::test]
    async fn test_index_embeds_qr_once_published() {
        let board = PairingBoard::new();
        board.publish_code("2@pairing-code").await;

        let response = router(&board)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(body_text(response).await.contains("<img src=\"/qr\""));
    }

    #[tokio::test]
    async fn test_index_reports_connected() {
        let board = PairingBoard::new();
        board.publish_code("2@pairing-code").await;
        board.set_connection(ConnectionState::Open).await;

        let response = router(&board)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(body_text(response).await.contains("Connected"));
    }

    #[tokio::test]
    async fn test_qr_not_found_without_code() {
        let board = PairingBoard::new();
        let response = router(&board)
            .oneshot(Request::get("/qr").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "No QR code available");
    }

    #[tokio::test]
    async fn test_qr_serves_png() {
        let board = PairingBoard::new();
        board.publish_code("2@pairing-code").await;

        let response = router(&board)
            .oneshot(Request::get("/qr").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn test_health_reports_board() {
        let board = PairingBoard::new();
        board.set_connection(ConnectionState::Connecting).await;

        let response = router(&board)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let health: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["connection"], "connecting");
        assert_eq!(health["has_pairing_code"], false);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let board = PairingBoard::new();
        let response = router(&board)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
