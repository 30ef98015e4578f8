//! Call bounded context - tracks the lifecycle of incoming calls

pub mod entity;
pub mod event;
pub mod tracker;
pub mod value_object;

pub use entity::CallRecord;
pub use event::CallEvent;
pub use tracker::{CallTracker, TerminateDecision};
pub use value_object::CallStatus;
