//! Interface layer - External interfaces
//!
//! This layer handles:
//! - The HTTP pairing preview and health endpoints
//! - Prometheus metrics exposition

pub mod api;
