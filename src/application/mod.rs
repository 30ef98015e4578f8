//! Application layer - Use cases and application services
//!
//! This layer orchestrates domain objects to fulfill use cases:
//! - Auto-responding to unanswered calls
//! - Supervising client sessions across reconnects
//! - Publishing the latest pairing code

pub mod pairing;
pub mod responder;
pub mod retry;
pub mod supervisor;

pub use pairing::PairingBoard;
pub use responder::{AutoResponder, DeliveryOutcome, ResponderSettings, ResponseReport};
pub use retry::{retry_with_policy, RetryPolicy};
pub use supervisor::{ConnectionSupervisor, SupervisorError, SupervisorExit};
