//! Domain layer - Core call-handling rules and the ports they depend on
//!
//! This layer contains:
//! - The call tracker and its records
//! - Port traits for the messaging client, session storage and audio clip

pub mod audio;
pub mod call;
pub mod messaging;
pub mod session;
pub mod shared;

// Re-export commonly used types
pub use shared::{DomainError, Result};
