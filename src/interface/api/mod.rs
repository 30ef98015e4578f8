//! HTTP API implementations

pub mod metrics_handler;
pub mod pairing_handler;
pub mod router;

pub use metrics_handler::init_metrics;
pub use router::build_router;
