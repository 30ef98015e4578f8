//! Call record entity

use crate::domain::shared::value_objects::{CallId, PeerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observed state of one incoming call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_id: CallId,
    pub caller_id: PeerId,
    pub accepted: bool,
    pub first_seen: DateTime<Utc>,
    /// Set once a response flow owns this record
    pub responding: bool,
}

impl CallRecord {
    pub fn new(call_id: CallId, caller_id: PeerId) -> Self {
        Self {
            call_id,
            caller_id,
            accepted: false,
            first_seen: Utc::now(),
            responding: false,
        }
    }
}
