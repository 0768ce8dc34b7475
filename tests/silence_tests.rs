// Tests for the silence auto-stop policy
//
// Short windows keep these fast; the generous recv timeouts keep them
// stable on slow machines.

use std::sync::Arc;
use std::time::Duration;

use speech_session::{
    BackendEvent, ChannelNotifier, ListeningStatus, ModelHandle, ModelRegistry, Notification,
    RecognitionConfig, ScriptStep, ScriptedFactory, SessionController, SessionHandle,
    StartOptions, StartOutcome,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

fn spawn_with_window(
    script: Vec<ScriptStep>,
    silence_window_ms: u64,
) -> (SessionHandle, UnboundedReceiver<Notification>) {
    let registry = ModelRegistry::new("en-US");
    registry.register(ModelHandle::new("en-US"));
    registry.mark_ready();

    let config = RecognitionConfig {
        silence_window_ms,
        ..RecognitionConfig::default()
    };
    let (notifier, notifications) = ChannelNotifier::new();
    let handle = SessionController::spawn(
        config,
        Arc::new(registry),
        Box::new(ScriptedFactory::new(script)),
        Arc::new(notifier),
        Arc::new(|| true),
    );
    (handle, notifications)
}

fn emit(event: BackendEvent) -> ScriptStep {
    ScriptStep::Emit(event)
}

fn streaming_options() -> StartOptions {
    StartOptions {
        partial_results: true,
        ..Default::default()
    }
}

async fn wait_for_status(rx: &mut UnboundedReceiver<Notification>, status: ListeningStatus) {
    loop {
        let event = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for notification")
            .expect("notifier closed");
        if let Notification::ListeningState(event) = event {
            if event.status == status {
                return;
            }
        }
    }
}

#[tokio::test]
async fn test_silence_after_end_of_speech_stops_session() {
    let script = vec![
        emit(BackendEvent::SpeechStarted),
        emit(BackendEvent::Partial("hi".to_string())),
        emit(BackendEvent::SpeechEnded),
        // Nothing further: the window should run out.
        ScriptStep::Wait(Duration::from_secs(60)),
    ];
    let (handle, mut notifications) = spawn_with_window(script, 80);

    handle.start(streaming_options()).await.expect("start");
    wait_for_status(&mut notifications, ListeningStatus::Started).await;

    wait_for_status(&mut notifications, ListeningStatus::Stopped).await;
    assert!(!handle.is_listening().await);

    // Exactly one terminal status: nothing else may arrive.
    if let Ok(event) = timeout(Duration::from_millis(200), notifications.recv()).await {
        panic!("unexpected notification after auto-stop: {:?}", event);
    }
}

#[tokio::test]
async fn test_speech_activity_cancels_auto_stop() {
    let script = vec![
        emit(BackendEvent::SpeechStarted),
        emit(BackendEvent::SpeechEnded),
        ScriptStep::Wait(Duration::from_millis(50)),
        // Activity well inside the window: the pending stop is dropped.
        emit(BackendEvent::Partial("still here".to_string())),
        ScriptStep::Wait(Duration::from_secs(60)),
    ];
    let (handle, mut notifications) = spawn_with_window(script, 300);

    handle.start(streaming_options()).await.expect("start");
    wait_for_status(&mut notifications, ListeningStatus::Started).await;

    // Drain the transcript update, then verify no stop arrives even long
    // after the first armed window would have elapsed.
    let mut saw_transcript = false;
    let deadline = timeout(Duration::from_millis(700), async {
        while let Some(event) = notifications.recv().await {
            match event {
                Notification::PartialResults(_) => saw_transcript = true,
                Notification::ListeningState(event)
                    if event.status == ListeningStatus::Stopped =>
                {
                    panic!("session auto-stopped despite speech activity")
                }
                _ => {}
            }
        }
    })
    .await;
    assert!(deadline.is_err(), "notifier closed unexpectedly");
    assert!(saw_transcript);
    assert!(handle.is_listening().await);

    handle.stop().await;
}

#[tokio::test]
async fn test_final_result_rearms_window_in_streaming_mode() {
    let script = vec![
        emit(BackendEvent::SpeechStarted),
        emit(BackendEvent::Partial("first utterance".to_string())),
        emit(BackendEvent::Final("first utterance".to_string())),
        ScriptStep::Wait(Duration::from_secs(60)),
    ];
    let (handle, mut notifications) = spawn_with_window(script, 80);

    handle.start(streaming_options()).await.expect("start");
    wait_for_status(&mut notifications, ListeningStatus::Started).await;

    // The final result starts the countdown; with no further speech the
    // session ends on its own.
    wait_for_status(&mut notifications, ListeningStatus::Stopped).await;
    assert!(!handle.is_listening().await);
}

#[tokio::test]
async fn test_one_shot_session_stops_when_final_never_arrives() {
    let script = vec![
        emit(BackendEvent::Ready),
        emit(BackendEvent::SpeechStarted),
        emit(BackendEvent::SpeechEnded),
        // The engine goes quiet without flushing a final result.
        ScriptStep::Wait(Duration::from_secs(60)),
    ];
    let (handle, mut notifications) = spawn_with_window(script, 80);

    let result = handle.start(StartOptions::default()).await;

    // The window resolves the parked request with what was heard: nothing.
    assert_eq!(
        result,
        Ok(StartOutcome::Finished {
            matches: vec![String::new()]
        })
    );
    wait_for_status(&mut notifications, ListeningStatus::Stopped).await;
}
