//! Call value objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status carried by a platform call event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CallStatus {
    /// The call is offered and ringing on our side
    Ringing,
    /// The call was picked up (on any linked device)
    Accept,
    /// The call ended, answered or not
    Terminate,
    /// Any status we do not act on (`timeout`, `reject`, ...)
    Other(String),
}

impl CallStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CallStatus::Ringing => "ringing",
            CallStatus::Accept => "accept",
            CallStatus::Terminate => "terminate",
            CallStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for CallStatus {
    fn from(value: &str) -> Self {
        match value {
            "ringing" => CallStatus::Ringing,
            "accept" => CallStatus::Accept,
            "terminate" => CallStatus::Terminate,
            other => CallStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for CallStatus {
    fn from(value: String) -> Self {
        CallStatus::from(value.as_str())
    }
}

impl From<CallStatus> for String {
    fn from(value: CallStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
