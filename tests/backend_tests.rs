// Tests for the scripted recognition backend and the adapter contract

use std::time::Duration;

use speech_session::{
    BackendEvent, BackendFactory, CallOp, CallProbe, ErrorCode, ModelHandle, RecognitionBackend,
    ScriptStep, ScriptedBackend, ScriptedFactory, SessionParams,
};

fn params() -> SessionParams {
    SessionParams {
        language: "en-US".to_string(),
        model: ModelHandle::new("en-US"),
        partial_results: true,
        max_results: 5,
        prompt: None,
    }
}

fn emit(event: BackendEvent) -> ScriptStep {
    ScriptStep::Emit(event)
}

#[tokio::test]
async fn test_scripted_backend_replays_events_in_order() {
    let script = vec![
        emit(BackendEvent::Ready),
        emit(BackendEvent::SpeechStarted),
        ScriptStep::Wait(Duration::from_millis(10)),
        emit(BackendEvent::Partial("hi".to_string())),
        emit(BackendEvent::Final("hi there".to_string())),
    ];

    let mut backend = ScriptedBackend::new("scripted", script);
    let mut events = backend.start(params()).await.expect("start");

    let mut received = Vec::new();
    while let Some(event) = events.recv().await {
        received.push(event);
    }

    assert_eq!(
        received,
        vec![
            BackendEvent::Ready,
            BackendEvent::SpeechStarted,
            BackendEvent::Partial("hi".to_string()),
            BackendEvent::Final("hi there".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_scripted_backend_is_single_use() {
    let mut backend = ScriptedBackend::new("scripted", vec![emit(BackendEvent::Ready)]);

    backend.start(params()).await.expect("first start");
    assert!(backend.start(params()).await.is_err());
}

#[tokio::test]
async fn test_failing_backend_refuses_to_start() {
    let mut backend = ScriptedBackend::new("scripted", Vec::new()).fail_start();
    assert!(backend.start(params()).await.is_err());
}

#[tokio::test]
async fn test_probe_records_adapter_calls() {
    let probe = CallProbe::new();
    let mut backend =
        ScriptedBackend::new("scripted", vec![emit(BackendEvent::Ready)]).with_probe(probe.clone());

    let _events = backend.start(params()).await.expect("start");
    backend.stop().await.expect("stop");

    assert_eq!(probe.calls_for("scripted"), vec![CallOp::Start, CallOp::Stop]);
}

#[tokio::test]
async fn test_stop_aborts_replay() {
    let script = vec![
        emit(BackendEvent::Ready),
        ScriptStep::Wait(Duration::from_secs(60)),
        emit(BackendEvent::Final("never".to_string())),
    ];

    let mut backend = ScriptedBackend::new("scripted", script);
    let mut events = backend.start(params()).await.expect("start");

    assert_eq!(events.recv().await, Some(BackendEvent::Ready));
    backend.stop().await.expect("stop");

    // Replay task is gone, so the channel closes instead of delivering.
    assert_eq!(events.recv().await, None);
}

#[tokio::test]
async fn test_factory_numbers_handles() {
    let factory = ScriptedFactory::new(vec![emit(BackendEvent::Error(ErrorCode::NoMatch))]);

    let first = factory.create(&params()).expect("create");
    let second = factory.create(&params()).expect("create");

    assert_eq!(first.name(), "scripted-1");
    assert_eq!(second.name(), "scripted-2");
}
