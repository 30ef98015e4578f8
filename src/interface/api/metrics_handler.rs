//! Prometheus metrics handler

use crate::domain::call::CallStatus;
use crate::domain::messaging::MessageKind;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and describe our metrics
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(
        "autoreply_call_events_total",
        "Call events received, by status"
    );
    describe_counter!(
        "autoreply_deliveries_total",
        "Auto-response messages, by kind and outcome"
    );
    describe_counter!(
        "autoreply_reconnects_total",
        "Client sessions restarted after a disconnect"
    );
    describe_gauge!(
        "autoreply_tracked_calls",
        "Calls currently held by the call tracker"
    );

    Ok(handle)
}

/// HTTP metrics handler
pub async fn metrics_handler(State(prometheus_handle): State<PrometheusHandle>) -> Response {
    let metrics = prometheus_handle.render();
    (StatusCode::OK, metrics).into_response()
}

/// Record an incoming call event
pub fn record_call_event(status: &CallStatus) {
    let status = match status {
        CallStatus::Ringing => "ringing",
        CallStatus::Accept => "accept",
        CallStatus::Terminate => "terminate",
        CallStatus::Other(_) => "other",
    };
    counter!("autoreply_call_events_total", "status" => status).increment(1);
}

/// Record the outcome of one auto-response message
pub fn record_delivery(kind: MessageKind, outcome: &'static str) {
    counter!("autoreply_deliveries_total", "kind" => kind.as_str(), "outcome" => outcome)
        .increment(1);
}

/// Record a session restart
pub fn record_reconnect() {
    counter!("autoreply_reconnects_total").increment(1);
}

/// Update tracked calls gauge
pub fn update_tracked_calls(count: usize) {
    gauge!("autoreply_tracked_calls").set(count as f64);
}
