//! call-autoreply - Answers missed voice calls with a voice note and a text
//!
//! Layered the Domain-Driven Design (DDD) way: call tracking and delivery
//! rules live in the domain and application layers, the gateway client,
//! session files and QR rendering in infrastructure, and the pairing
//! preview and metrics endpoints in the interface layer.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
