//! Inbound call events

use crate::domain::call::value_object::CallStatus;
use crate::domain::shared::value_objects::{CallId, PeerId};
use serde::{Deserialize, Serialize};

/// One call status notification, as delivered in a platform call batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvent {
    pub id: CallId,
    pub from: PeerId,
    pub status: CallStatus,
}

impl CallEvent {
    pub fn new(id: impl Into<String>, from: impl Into<String>, status: CallStatus) -> Self {
        Self {
            id: CallId::from(id.into()),
            from: PeerId::from(from.into()),
            status,
        }
    }

    pub fn ringing(id: &str, from: &str) -> Self {
        Self::new(id, from, CallStatus::Ringing)
    }

    pub fn accept(id: &str, from: &str) -> Self {
        Self::new(id, from, CallStatus::Accept)
    }

    pub fn terminate(id: &str, from: &str) -> Self {
        Self::new(id, from, CallStatus::Terminate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserialize() {
        let json = r#"{"id":"C1","from":"111@s.whatsapp.net","status":"ringing"}"#;
        let event: CallEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, CallEvent::ringing("C1", "111@s.whatsapp.net"));
    }
}
