//! Messaging gateway adapter
//!
//! The platform client library runs in a separate gateway process. This
//! module speaks to it over a WebSocket with JSON frames and exposes it as a
//! [`MessagingClient`](crate::domain::messaging::MessagingClient) plus an
//! event stream.

mod client;
mod error;
pub mod protocol;

pub use client::{GatewayClient, GatewayConnector};
pub use error::GatewayError;
