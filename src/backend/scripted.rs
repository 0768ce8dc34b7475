use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{BackendEvent, BackendFactory, RecognitionBackend, SessionParams};

/// One step of a scripted engine run.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Deliver an event
    Emit(BackendEvent),
    /// Sleep before the next step
    Wait(Duration),
}

/// Which adapter method was invoked on a scripted handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOp {
    Start,
    Stop,
    Cancel,
}

/// A recorded adapter call, tagged with the handle that received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub backend: String,
    pub op: CallOp,
}

/// Shared recorder of adapter calls across scripted handles.
///
/// Lets a test assert teardown ordering, e.g. that a superseded handle got
/// exactly one stop before the next handle's start.
#[derive(Debug, Clone, Default)]
pub struct CallProbe {
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl CallProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, backend: &str, op: CallOp) {
        self.calls.lock().unwrap().push(BackendCall {
            backend: backend.to_string(),
            op,
        });
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls received by one handle, in order.
    pub fn calls_for(&self, backend: &str) -> Vec<CallOp> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.backend == backend)
            .map(|c| c.op)
            .collect()
    }
}

/// Engine that replays a fixed event script.
///
/// Stands in for a real recognizer in tests and local development: the
/// script decides whether it behaves like a one-shot engine (single final)
/// or a streaming one (partial/final pairs).
pub struct ScriptedBackend {
    name: String,
    script: Vec<ScriptStep>,
    fail_start: bool,
    probe: Option<CallProbe>,
    started: bool,
    replay: Option<JoinHandle<()>>,
}

impl ScriptedBackend {
    pub fn new(name: impl Into<String>, script: Vec<ScriptStep>) -> Self {
        Self {
            name: name.into(),
            script,
            fail_start: false,
            probe: None,
            started: false,
            replay: None,
        }
    }

    /// Make `start` fail instead of replaying.
    pub fn fail_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Record adapter calls into the given probe.
    pub fn with_probe(mut self, probe: CallProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    fn record(&self, op: CallOp) {
        if let Some(probe) = &self.probe {
            probe.record(&self.name, op);
        }
    }

    fn abort_replay(&mut self) {
        if let Some(handle) = self.replay.take() {
            handle.abort();
        }
    }
}

#[async_trait::async_trait]
impl RecognitionBackend for ScriptedBackend {
    async fn start(&mut self, params: SessionParams) -> Result<mpsc::Receiver<BackendEvent>> {
        self.record(CallOp::Start);

        if self.fail_start {
            bail!("scripted engine refused to start");
        }
        if self.started {
            bail!("scripted engine already started");
        }
        self.started = true;

        debug!(
            backend = %self.name,
            language = %params.language,
            partial = params.partial_results,
            "starting scripted replay"
        );

        let (tx, rx) = mpsc::channel(32);
        let script = self.script.clone();

        self.replay = Some(tokio::spawn(async move {
            for step in script {
                match step {
                    ScriptStep::Wait(duration) => tokio::time::sleep(duration).await,
                    ScriptStep::Emit(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.record(CallOp::Stop);
        self.abort_replay();
        Ok(())
    }

    async fn cancel(&mut self) -> Result<()> {
        self.record(CallOp::Cancel);
        self.abort_replay();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ScriptedBackend {
    fn drop(&mut self) {
        self.abort_replay();
    }
}

/// Factory handing out numbered scripted handles, all replaying the same
/// script.
pub struct ScriptedFactory {
    script: Vec<ScriptStep>,
    fail_start: bool,
    probe: Option<CallProbe>,
    counter: AtomicUsize,
}

impl ScriptedFactory {
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            script,
            fail_start: false,
            probe: None,
            counter: AtomicUsize::new(0),
        }
    }

    /// Every created handle refuses to start.
    pub fn failing() -> Self {
        let mut factory = Self::new(Vec::new());
        factory.fail_start = true;
        factory
    }

    pub fn with_probe(mut self, probe: CallProbe) -> Self {
        self.probe = Some(probe);
        self
    }
}

impl BackendFactory for ScriptedFactory {
    fn create(&self, _params: &SessionParams) -> Result<Box<dyn RecognitionBackend>> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let mut backend = ScriptedBackend::new(format!("scripted-{}", n), self.script.clone());
        if self.fail_start {
            backend = backend.fail_start();
        }
        if let Some(probe) = &self.probe {
            backend = backend.with_probe(probe.clone());
        }
        Ok(Box::new(backend))
    }
}
