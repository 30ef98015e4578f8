//! Auto-responder integration tests

use async_trait::async_trait;
use bytes::Bytes;
use call_autoreply::application::responder::{DeliveryOutcome, SkipReason};
use call_autoreply::application::{AutoResponder, ResponderSettings, RetryPolicy};
use call_autoreply::domain::audio::AudioSource;
use call_autoreply::domain::call::CallEvent;
use call_autoreply::domain::messaging::{
    ClientEvent, MessageKind, MessagePayload, MessagingClient, SendError,
};
use call_autoreply::domain::shared::value_objects::{CallId, PeerId};
use call_autoreply::infrastructure::gateway::protocol::Inbound;
use call_autoreply::infrastructure::media::FileAudioSource;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CALLER: &str = "15551234567@s.whatsapp.net";

/// Records every send; the first `fail_audio` / `fail_text` sends of each kind fail
#[derive(Default)]
struct RecordingClient {
    sent: Mutex<Vec<(PeerId, MessagePayload)>>,
    fail_audio: Mutex<u32>,
    fail_text: Mutex<u32>,
}

impl RecordingClient {
    fn failing(audio: u32, text: u32) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_audio: Mutex::new(audio),
            fail_text: Mutex::new(text),
        }
    }

    fn kinds(&self) -> Vec<MessageKind> {
        self.sent.lock().unwrap().iter().map(|(_, p)| p.kind()).collect()
    }
}

#[async_trait]
impl MessagingClient for RecordingClient {
    async fn send_message(&self, to: &PeerId, payload: MessagePayload) -> Result<(), SendError> {
        let kind = payload.kind();
        self.sent.lock().unwrap().push((to.clone(), payload));

        let mut remaining = match kind {
            MessageKind::Audio => self.fail_audio.lock().unwrap(),
            MessageKind::Text => self.fail_text.lock().unwrap(),
        };
        if *remaining > 0 {
            *remaining = remaining.saturating_sub(1);
            return Err(SendError::Rejected("server busy".to_string()));
        }
        Ok(())
    }
}

/// Clip held in memory
struct StaticClip(Option<Bytes>);

#[async_trait]
impl AudioSource for StaticClip {
    async fn load(&self) -> std::io::Result<Option<Bytes>> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "in-memory clip".to_string()
    }
}

fn settings(settle_delay: Duration, backoff: Duration) -> ResponderSettings {
    ResponderSettings {
        settle_delay,
        retry: RetryPolicy::new(3, backoff),
        ..Default::default()
    }
}

fn responder(client: &Arc<RecordingClient>, audio: Arc<dyn AudioSource>) -> AutoResponder {
    AutoResponder::new(
        client.clone(),
        audio,
        settings(Duration::ZERO, Duration::ZERO),
    )
}

#[tokio::test]
async fn test_missed_call_gets_voice_note_then_text() {
    let dir = tempfile::tempdir().unwrap();
    let clip_path = dir.path().join("auto_response.mp3");
    std::fs::write(&clip_path, b"ID3-voice-note").unwrap();

    let client = Arc::new(RecordingClient::default());
    let responder = responder(&client, Arc::new(FileAudioSource::new(&clip_path)));

    assert!(responder
        .handle_batch(&[CallEvent::ringing("C1", CALLER)])
        .await
        .is_none());
    let report = responder
        .handle_batch(&[CallEvent::terminate("C1", CALLER)])
        .await
        .expect("missed call should be answered");

    assert_eq!(report.audio, DeliveryOutcome::Delivered { attempts: 1 });
    assert_eq!(report.text, Some(DeliveryOutcome::Delivered { attempts: 1 }));
    assert_eq!(report.fallback, None);
    assert!(responder.tracker().is_empty());

    let sent = client.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0.as_str(), CALLER);
    assert_eq!(
        sent[0].1,
        MessagePayload::voice_note(Bytes::from_static(b"ID3-voice-note"), "audio/mp4")
    );
    assert_eq!(
        sent[1].1,
        MessagePayload::text(call_autoreply::application::responder::DEFAULT_FALLBACK_TEXT)
    );
}

#[tokio::test]
async fn test_accepted_call_sends_nothing() {
    let client = Arc::new(RecordingClient::default());
    let responder = responder(&client, Arc::new(StaticClip(Some(Bytes::from_static(b"clip")))));

    let call_id = CallId::from("C2");

    assert!(responder
        .handle_batch(&[CallEvent::ringing("C2", CALLER)])
        .await
        .is_none());
    let record = responder.tracker().get(&call_id).unwrap();
    assert_eq!(record.caller_id.as_str(), CALLER);
    assert!(!record.accepted);

    assert!(responder
        .handle_batch(&[CallEvent::accept("C2", CALLER)])
        .await
        .is_none());
    assert!(responder.tracker().get(&call_id).unwrap().accepted);

    assert!(responder
        .handle_batch(&[CallEvent::terminate("C2", CALLER)])
        .await
        .is_none());

    assert!(client.kinds().is_empty());
    assert!(responder.tracker().is_empty());
}

#[tokio::test]
async fn test_missing_clip_sends_text_only() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(RecordingClient::default());
    let responder = responder(
        &client,
        Arc::new(FileAudioSource::new(dir.path().join("absent.mp3"))),
    );

    responder.dispatch(&[CallEvent::ringing("C3", CALLER)]);
    let report = responder
        .handle_batch(&[CallEvent::terminate("C3", CALLER)])
        .await
        .unwrap();

    assert_eq!(report.audio, DeliveryOutcome::Skipped(SkipReason::AudioMissing));
    assert_eq!(client.kinds(), vec![MessageKind::Text]);
}

#[tokio::test]
async fn test_terminate_without_ringing_is_ignored() {
    let client = Arc::new(RecordingClient::default());
    let responder = responder(&client, Arc::new(StaticClip(None)));

    assert!(responder
        .handle_batch(&[CallEvent::terminate("C4", CALLER)])
        .await
        .is_none());
    assert!(client.kinds().is_empty());
}

#[tokio::test]
async fn test_audio_failures_do_not_block_text() {
    let client = Arc::new(RecordingClient::failing(u32::MAX, 0));
    let responder = responder(&client, Arc::new(StaticClip(Some(Bytes::from_static(b"clip")))));

    responder.dispatch(&[CallEvent::ringing("C5", CALLER)]);
    let report = responder
        .handle_batch(&[CallEvent::terminate("C5", CALLER)])
        .await
        .unwrap();

    assert_eq!(report.audio.attempts(), 3);
    assert!(!report.audio.is_delivered());
    assert_eq!(report.text, Some(DeliveryOutcome::Delivered { attempts: 1 }));
    assert!(report.reached_caller());
    assert_eq!(
        client.kinds(),
        vec![
            MessageKind::Audio,
            MessageKind::Audio,
            MessageKind::Audio,
            MessageKind::Text
        ]
    );
}

#[tokio::test]
async fn test_text_exhaustion_triggers_single_fallback() {
    let client = Arc::new(RecordingClient::failing(0, u32::MAX));
    let responder = responder(&client, Arc::new(StaticClip(None)));

    responder.dispatch(&[CallEvent::ringing("C6", CALLER)]);
    let report = responder
        .handle_batch(&[CallEvent::terminate("C6", CALLER)])
        .await
        .unwrap();

    assert_eq!(report.text.as_ref().map(DeliveryOutcome::attempts), Some(3));
    assert_eq!(report.fallback, Some(false));
    assert!(!report.reached_caller());
    assert_eq!(client.kinds(), vec![MessageKind::Text; 4]);
    assert!(responder.tracker().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_settle_delay_and_backoff_timing() {
    let client = Arc::new(RecordingClient::failing(2, 0));
    let responder = AutoResponder::new(
        client.clone(),
        Arc::new(StaticClip(Some(Bytes::from_static(b"clip")))),
        settings(Duration::from_millis(1000), Duration::from_millis(1000)),
    );

    responder.dispatch(&[CallEvent::ringing("C7", CALLER)]);
    let record = responder
        .dispatch(&[CallEvent::terminate("C7", CALLER)])
        .unwrap();

    let started = tokio::time::Instant::now();
    let report = responder.spawn_response(record).await.unwrap();

    // 1s settle delay plus two 1s backoffs between the audio attempts
    assert!(started.elapsed() >= Duration::from_millis(3000));
    assert_eq!(report.audio, DeliveryOutcome::Delivered { attempts: 3 });
    assert_eq!(report.text, Some(DeliveryOutcome::Delivered { attempts: 1 }));
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let client = Arc::new(RecordingClient::default());
    let responder = responder(&client, Arc::new(StaticClip(None)));

    responder.dispatch(&[CallEvent::ringing("A", "111@s.whatsapp.net")]);
    responder.dispatch(&[CallEvent::ringing("B", "222@s.whatsapp.net")]);
    responder.dispatch(&[CallEvent::accept("B", "222@s.whatsapp.net")]);
    assert_eq!(responder.tracker().len(), 2);

    let record = responder
        .dispatch(&[CallEvent::terminate("A", "111@s.whatsapp.net")])
        .unwrap();
    responder.respond(record).await;
    assert!(responder
        .dispatch(&[CallEvent::terminate("B", "222@s.whatsapp.net")])
        .is_none());

    let sent = client.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0.as_str(), "111@s.whatsapp.net");
    assert!(responder.tracker().is_empty());
}

#[tokio::test]
async fn test_malformed_first_call_is_not_replaced_by_second() {
    let client = Arc::new(RecordingClient::default());
    let responder = responder(&client, Arc::new(StaticClip(None)));

    let frame: Inbound = serde_json::from_str(
        r#"{"type":"call","calls":[
            {"id":"","from":"111@s.whatsapp.net","status":"ringing"},
            {"id":"C2","from":"222@s.whatsapp.net","status":"ringing"}
        ]}"#,
    )
    .unwrap();
    let Some(ClientEvent::Call(batch)) = frame.into_event() else {
        panic!("call frame should produce a call batch");
    };

    assert!(responder.dispatch(&batch).is_none());
    assert!(!responder.tracker().contains(&CallId::from("C2")));
    assert!(responder.tracker().is_empty());
}
