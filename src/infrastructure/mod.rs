//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - The WebSocket gateway adapter for the messaging client
//! - File-backed session storage
//! - Media helpers (response clip, QR rendering)

pub mod gateway;
pub mod media;
pub mod persistence;
