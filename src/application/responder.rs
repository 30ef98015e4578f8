//! Call auto-responder
//!
//! Consumes call events, keeps the [`CallTracker`] in step with them and,
//! when a call rings out without being accepted, replies to the caller with
//! a voice note followed by a text message.
//!
//! Dispatch is synchronous so per-call ordering follows event order. The
//! response flow is async and may be spawned so several flows can overlap.

use crate::application::retry::{retry_with_policy, RetryPolicy};
use crate::config::ResponderConfig;
use crate::domain::audio::AudioSource;
use crate::domain::call::{CallEvent, CallRecord, CallStatus, CallTracker, TerminateDecision};
use crate::domain::messaging::{MessageKind, MessagePayload, MessagingClient, SendError};
use crate::domain::shared::value_objects::{CallId, PeerId};
use crate::interface::api::metrics_handler::{
    record_call_event, record_delivery, update_tracked_calls,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Text sent when the caller could not be reached by voice note
pub const DEFAULT_FALLBACK_TEXT: &str =
    "I'm maybe offline or unavailable and couldn't process your call. Please try again later!";

/// Tunables of the response flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderSettings {
    /// Wait before the first send so the platform can finish tearing the call down
    pub settle_delay: Duration,
    pub retry: RetryPolicy,
    pub audio_mimetype: String,
    pub fallback_text: String,
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
            retry: RetryPolicy::default(),
            audio_mimetype: "audio/mp4".to_string(),
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
        }
    }
}

impl From<&ResponderConfig> for ResponderSettings {
    fn from(config: &ResponderConfig) -> Self {
        Self {
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            retry: RetryPolicy::new(config.max_attempts, Duration::from_millis(config.backoff_ms)),
            audio_mimetype: config.audio_mimetype.clone(),
            fallback_text: config.fallback_text.clone(),
        }
    }
}

/// Why a message was not even attempted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    AudioMissing,
    AudioUnreadable(String),
}

/// Result of delivering one message with retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Failed { attempts: u32, error: SendError },
    Skipped(SkipReason),
}

impl DeliveryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts } | DeliveryOutcome::Failed { attempts, .. } => {
                *attempts
            }
            DeliveryOutcome::Skipped(_) => 0,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// What the response flow did for one unanswered call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseReport {
    pub call_id: CallId,
    pub caller_id: PeerId,
    pub audio: DeliveryOutcome,
    /// `None` when the flow aborted before the text step
    pub text: Option<DeliveryOutcome>,
    /// `Some(delivered)` when the single best-effort fallback text was tried
    pub fallback: Option<bool>,
}

impl ResponseReport {
    /// Did the caller get at least one message
    pub fn reached_caller(&self) -> bool {
        self.audio.is_delivered()
            || self.text.as_ref().is_some_and(DeliveryOutcome::is_delivered)
            || self.fallback == Some(true)
    }
}

/// Call auto-responder
#[derive(Clone)]
pub struct AutoResponder {
    tracker: CallTracker,
    client: Arc<dyn MessagingClient>,
    audio: Arc<dyn AudioSource>,
    settings: Arc<ResponderSettings>,
}

impl AutoResponder {
    pub fn new(
        client: Arc<dyn MessagingClient>,
        audio: Arc<dyn AudioSource>,
        settings: ResponderSettings,
    ) -> Self {
        Self::with_tracker(CallTracker::new(), client, audio, settings)
    }

    pub fn with_tracker(
        tracker: CallTracker,
        client: Arc<dyn MessagingClient>,
        audio: Arc<dyn AudioSource>,
        settings: ResponderSettings,
    ) -> Self {
        Self {
            tracker,
            client,
            audio,
            settings: Arc::new(settings),
        }
    }

    pub fn tracker(&self) -> &CallTracker {
        &self.tracker
    }

    pub fn settings(&self) -> &ResponderSettings {
        &self.settings
    }

    /// Apply a call batch to the tracker
    ///
    /// Only the first event is handled. Returns the record to respond to when
    /// that event ended an unanswered call; the caller must then run
    /// [`AutoResponder::respond`] (directly or via [`AutoResponder::spawn_response`]).
    pub fn dispatch(&self, batch: &[CallEvent]) -> Option<CallRecord> {
        debug!(
            "Raw call event: {}",
            serde_json::to_string(batch).unwrap_or_else(|_| format!("{:?}", batch))
        );

        let Some(event) = batch.first() else {
            debug!("Empty call batch");
            return None;
        };
        if batch.len() > 1 {
            warn!(
                call_id = %event.id,
                ignored = batch.len() - 1,
                "Call batch carried more than one event; only the first is handled"
            );
        }

        record_call_event(&event.status);
        info!(
            call_id = %event.id,
            caller = %event.from,
            status = %event.status,
            "Call from {} (ID: {}, Status: {})", event.from, event.id, event.status
        );

        let pending = self.apply(event);
        update_tracked_calls(self.tracker.len());
        pending
    }

    fn apply(&self, event: &CallEvent) -> Option<CallRecord> {
        match &event.status {
            CallStatus::Ringing => {
                if self.tracker.register(event.id.clone(), event.from.clone()) {
                    info!(call_id = %event.id, "Incoming call from {}", event.from);
                } else {
                    debug!(call_id = %event.id, "Ringing for already tracked call");
                }
                None
            }
            CallStatus::Accept => {
                if self.tracker.mark_accepted(&event.id) {
                    info!(call_id = %event.id, "Call accepted from {}", event.from);
                } else {
                    debug!(call_id = %event.id, "Accept for untracked call");
                }
                None
            }
            CallStatus::Terminate => {
                info!(call_id = %event.id, "Call terminated from {}", event.from);
                match self.tracker.begin_response(&event.id) {
                    TerminateDecision::Respond(record) => Some(record),
                    TerminateDecision::Accepted => {
                        info!(call_id = %event.id, "No action taken: call was accepted");
                        None
                    }
                    TerminateDecision::InProgress => {
                        debug!(call_id = %event.id, "Response already in progress");
                        None
                    }
                    TerminateDecision::Untracked => {
                        info!(call_id = %event.id, "No action taken: call not tracked");
                        None
                    }
                }
            }
            CallStatus::Other(status) => {
                warn!(call_id = %event.id, "Unhandled call status: {}", status);
                None
            }
        }
    }

    /// Dispatch a batch and, if needed, run the response flow to completion
    pub async fn handle_batch(&self, batch: &[CallEvent]) -> Option<ResponseReport> {
        let record = self.dispatch(batch)?;
        Some(self.respond(record).await)
    }

    /// Run the response flow on its own task
    pub fn spawn_response(&self, record: CallRecord) -> JoinHandle<ResponseReport> {
        let responder = self.clone();
        tokio::spawn(async move { responder.respond(record).await })
    }

    /// Reply to the caller of an unanswered call, then forget the call
    pub async fn respond(&self, record: CallRecord) -> ResponseReport {
        let report = self.run_flow(&record).await;

        self.tracker.remove(&record.call_id);
        update_tracked_calls(self.tracker.len());

        if report.reached_caller() {
            info!(call_id = %record.call_id, "Auto-response finished for {}", record.caller_id);
        } else {
            error!(call_id = %record.call_id, "Could not reach {} by any message", record.caller_id);
        }
        report
    }

    async fn run_flow(&self, record: &CallRecord) -> ResponseReport {
        let caller = &record.caller_id;

        if !self.settings.settle_delay.is_zero() {
            tokio::time::sleep(self.settings.settle_delay).await;
        }

        let audio = match self.audio.load().await {
            Ok(Some(clip)) => {
                let payload = MessagePayload::voice_note(clip, self.settings.audio_mimetype.clone());
                self.deliver(caller, payload).await
            }
            Ok(None) => {
                warn!(
                    caller = %caller,
                    "Voice message file ({}) not found, sending text only",
                    self.audio.describe()
                );
                DeliveryOutcome::Skipped(SkipReason::AudioMissing)
            }
            Err(e) => {
                error!(
                    caller = %caller,
                    error = %e,
                    "Error handling terminated call: cannot read {}",
                    self.audio.describe()
                );
                let fallback = self.send_fallback(caller).await;
                return ResponseReport {
                    call_id: record.call_id.clone(),
                    caller_id: caller.clone(),
                    audio: DeliveryOutcome::Skipped(SkipReason::AudioUnreadable(e.to_string())),
                    text: None,
                    fallback: Some(fallback),
                };
            }
        };

        let text = self
            .deliver(caller, MessagePayload::text(self.settings.fallback_text.clone()))
            .await;

        let fallback = match &text {
            DeliveryOutcome::Failed { .. } => Some(self.send_fallback(caller).await),
            _ => None,
        };

        ResponseReport {
            call_id: record.call_id.clone(),
            caller_id: caller.clone(),
            audio,
            text: Some(text),
            fallback,
        }
    }

    async fn deliver(&self, to: &PeerId, payload: MessagePayload) -> DeliveryOutcome {
        let kind = payload.kind();
        let label = match kind {
            MessageKind::Audio => format!("Voice message to {}", to),
            MessageKind::Text => format!("Text message to {}", to),
        };
        info!("Sending {} message to {}", kind, to);

        let client = &self.client;
        let result = retry_with_policy(&self.settings.retry, &label, |_| {
            let payload = payload.clone();
            async move { client.send_message(to, payload).await }
        })
        .await;

        match result {
            Ok(sent) => {
                record_delivery(kind, "delivered");
                info!(attempts = sent.attempts, "{} message sent to {}", kind, to);
                DeliveryOutcome::Delivered {
                    attempts: sent.attempts,
                }
            }
            Err(exhausted) => {
                record_delivery(kind, "failed");
                error!("{} failed: {}", label, exhausted);
                DeliveryOutcome::Failed {
                    attempts: exhausted.attempts,
                    error: exhausted.last_error,
                }
            }
        }
    }

    /// One best-effort text, never retried; failure is only logged
    async fn send_fallback(&self, to: &PeerId) -> bool {
        let payload = MessagePayload::text(self.settings.fallback_text.clone());
        match self.client.send_message(to, payload).await {
            Ok(()) => {
                record_delivery(MessageKind::Text, "fallback_delivered");
                info!("Fallback text message sent to {}", to);
                true
            }
            Err(e) => {
                record_delivery(MessageKind::Text, "fallback_failed");
                error!(error = %e, "Failed to send fallback message to {}", to);
                false
            }
        }
    }
}
