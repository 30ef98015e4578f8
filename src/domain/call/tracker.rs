//! In-memory registry of calls seen during the current session
//!
//! The tracker is the only state shared between the event-dispatch loop and
//! spawned response flows. Every operation takes the lock briefly and never
//! across an `.await`, so it is safe to call from any task.

use crate::domain::call::entity::CallRecord;
use crate::domain::shared::value_objects::{CallId, PeerId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Outcome of a `terminate` event for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminateDecision {
    /// Rang and was never accepted: the caller owns the response flow and
    /// must `remove` the record when it is done
    Respond(CallRecord),
    /// Was accepted before it ended; the record has been removed
    Accepted,
    /// A response flow for this call is already running
    InProgress,
    /// Never saw it ring (or it was already cleaned up)
    Untracked,
}

/// Call tracker
#[derive(Clone, Default)]
pub struct CallTracker {
    calls: Arc<Mutex<HashMap<CallId, CallRecord>>>,
}

impl CallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn calls(&self) -> MutexGuard<'_, HashMap<CallId, CallRecord>> {
        // A panic while holding the lock cannot leave a record half-written,
        // so the map is still consistent.
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start tracking a ringing call. Returns `false` if it is already tracked.
    pub fn register(&self, call_id: CallId, caller_id: PeerId) -> bool {
        let mut calls = self.calls();
        if calls.contains_key(&call_id) {
            return false;
        }
        calls.insert(call_id.clone(), CallRecord::new(call_id, caller_id));
        true
    }

    /// Flag a tracked call as accepted. Returns `false` if it is not tracked.
    pub fn mark_accepted(&self, call_id: &CallId) -> bool {
        match self.calls().get_mut(call_id) {
            Some(record) => {
                record.accepted = true;
                true
            }
            None => false,
        }
    }

    /// Stop tracking a call, returning its last state if it was tracked
    pub fn remove(&self, call_id: &CallId) -> Option<CallRecord> {
        self.calls().remove(call_id)
    }

    pub fn get(&self, call_id: &CallId) -> Option<CallRecord> {
        self.calls().get(call_id).cloned()
    }

    pub fn contains(&self, call_id: &CallId) -> bool {
        self.calls().contains_key(call_id)
    }

    /// Decide what a `terminate` event means for a call, atomically
    pub fn begin_response(&self, call_id: &CallId) -> TerminateDecision {
        let mut calls = self.calls();
        let Some(record) = calls.get_mut(call_id) else {
            return TerminateDecision::Untracked;
        };

        if record.accepted {
            calls.remove(call_id);
            return TerminateDecision::Accepted;
        }
        if record.responding {
            return TerminateDecision::InProgress;
        }

        record.responding = true;
        TerminateDecision::Respond(record.clone())
    }

    pub fn len(&self) -> usize {
        self.calls().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls().is_empty()
    }

    /// Copy of every tracked record, oldest first
    pub fn snapshot(&self) -> Vec<CallRecord> {
        let mut records: Vec<CallRecord> = self.calls().values().cloned().collect();
        records.sort_by_key(|r| r.first_seen);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> CallId {
        CallId::from(s)
    }

    #[test]
    fn test_register_only_once() {
        let tracker = CallTracker::new();
        assert!(tracker.register(id("1"), PeerId::from("A")));
        assert!(!tracker.register(id("1"), PeerId::from("B")));

        let record = tracker.get(&id("1")).unwrap();
        assert_eq!(record.caller_id, PeerId::from("A"));
        assert!(!record.accepted);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_mark_accepted() {
        let tracker = CallTracker::new();
        assert!(!tracker.mark_accepted(&id("1")));
        assert!(tracker.is_empty());

        tracker.register(id("1"), PeerId::from("A"));
        assert!(tracker.mark_accepted(&id("1")));
        assert!(tracker.get(&id("1")).unwrap().accepted);
    }

    #[test]
    fn test_remove_is_unconditional() {
        let tracker = CallTracker::new();
        assert!(tracker.remove(&id("missing")).is_none());

        tracker.register(id("1"), PeerId::from("A"));
        assert!(tracker.remove(&id("1")).is_some());
        assert!(!tracker.contains(&id("1")));
    }

    #[test]
    fn test_begin_response_for_unanswered_call() {
        let tracker = CallTracker::new();
        tracker.register(id("2"), PeerId::from("B"));

        match tracker.begin_response(&id("2")) {
            TerminateDecision::Respond(record) => {
                assert_eq!(record.caller_id, PeerId::from("B"));
                assert!(record.responding);
            }
            other => panic!("unexpected decision: {:?}", other),
        }

        // Record stays until the flow cleans up; a repeated terminate is ignored
        assert!(tracker.contains(&id("2")));
        assert_eq!(tracker.begin_response(&id("2")), TerminateDecision::InProgress);
    }

    #[test]
    fn test_begin_response_for_accepted_call_removes_it() {
        let tracker = CallTracker::new();
        tracker.register(id("1"), PeerId::from("A"));
        tracker.mark_accepted(&id("1"));

        assert_eq!(tracker.begin_response(&id("1")), TerminateDecision::Accepted);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_begin_response_for_untracked_call() {
        let tracker = CallTracker::new();
        assert_eq!(tracker.begin_response(&id("9")), TerminateDecision::Untracked);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let tracker = CallTracker::new();
        let other = tracker.clone();
        tracker.register(id("1"), PeerId::from("A"));
        tracker.register(id("2"), PeerId::from("B"));

        let snapshot = other.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].call_id, id("1"));
    }
}
