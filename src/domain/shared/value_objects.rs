//! Shared value objects used across multiple bounded contexts

use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform-assigned call identifier, opaque and stable for the call's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::ValidationError(
                "call id must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CallId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CallId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Addressable identifier of a chat peer (e.g. `15551234567@s.whatsapp.net`)
///
/// Messages can be sent to any `PeerId`; the platform decides whether it
/// names a user, a group or a linked device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::ValidationError(
                "peer id must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PeerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PeerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_parse() {
        let peer = PeerId::parse(" 15551234567@s.whatsapp.net ").unwrap();
        assert_eq!(peer.as_str(), "15551234567@s.whatsapp.net");
        assert_eq!(PeerId::parse("15551234567").unwrap().as_str(), "15551234567");
    }

    #[test]
    fn test_empty_ids_rejected() {
        assert!(PeerId::parse("   ").is_err());
        assert!(CallId::parse("").is_err());
    }

    #[test]
    fn test_call_id_display() {
        let id = CallId::parse("ABC123").unwrap();
        assert_eq!(id.to_string(), "ABC123");
        assert_eq!(id, CallId::from("ABC123"));
    }
}
