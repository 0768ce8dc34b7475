use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use speech_session::{
    create_router, AppState, BackendEvent, Config, EventNotifier, LogNotifier, ModelHandle,
    ModelRegistry, NatsNotifier, PermissionGate, ScriptStep, ScriptedFactory, SessionController,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "speech-session", about = "Continuous speech-recognition session service")]
struct Cli {
    /// Configuration file, without extension (config-rs style)
    #[arg(long, default_value = "config/speech-session")]
    config: String,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v0.1.0", cfg.service.name);
    info!("Default language: {}", cfg.recognition.default_language);
    info!("Silence window: {} ms", cfg.recognition.silence_window_ms);

    let registry = Arc::new(ModelRegistry::new(cfg.recognition.default_language.clone()));
    for entry in &cfg.models {
        let handle = match &entry.path {
            Some(path) => ModelHandle::with_path(entry.language.clone(), path),
            None => ModelHandle::new(entry.language.clone()),
        };
        registry.register(handle);
    }
    registry.mark_ready();

    let notifier: Arc<dyn EventNotifier> = match &cfg.nats {
        Some(nats) => {
            Arc::new(NatsNotifier::connect(&nats.url, nats.subject_prefix.clone()).await?)
        }
        None => Arc::new(LogNotifier),
    };

    // Simulated engine replaying a canned utterance; swap in a real
    // adapter to talk to an actual recognizer.
    let factory = ScriptedFactory::new(demo_script());

    // The service process owns its input; permission gating is the
    // embedder's concern.
    let permissions: Arc<dyn PermissionGate> = Arc::new(|| true);

    let session = SessionController::spawn(
        cfg.recognition.clone(),
        registry,
        Box::new(factory),
        notifier,
        permissions,
    );

    let state = AppState::new(session);
    let router = create_router(state);

    let bind = cli.bind.unwrap_or_else(|| cfg.service.http.bind.clone());
    let port = cli.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", bind, port);

    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn demo_script() -> Vec<ScriptStep> {
    use BackendEvent::*;

    vec![
        ScriptStep::Emit(Ready),
        ScriptStep::Wait(Duration::from_millis(200)),
        ScriptStep::Emit(SpeechStarted),
        ScriptStep::Emit(Partial("testing".into())),
        ScriptStep::Wait(Duration::from_millis(300)),
        ScriptStep::Emit(Partial("testing one two".into())),
        ScriptStep::Wait(Duration::from_millis(300)),
        ScriptStep::Emit(SpeechEnded),
        ScriptStep::Emit(Final("testing one two three".into())),
    ]
}
