use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub recognition: RecognitionConfig,
    /// Models to register at startup (language → optional path)
    #[serde(default)]
    pub models: Vec<ModelEntry>,
    /// Optional NATS event delivery; events go to the log when absent
    #[serde(default)]
    pub nats: Option<NatsConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionConfig {
    /// Language used when a start request carries no usable hint
    pub default_language: String,

    /// How long after end-of-speech the session auto-stops
    #[serde(default = "default_silence_window_ms")]
    pub silence_window_ms: u64,

    /// Upper bound on alternatives requested from the engine
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl RecognitionConfig {
    pub fn silence_window(&self) -> Duration {
        Duration::from_millis(self.silence_window_ms)
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            default_language: "en-US".to_string(),
            silence_window_ms: default_silence_window_ms(),
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub language: String,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    pub url: String,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

fn default_silence_window_ms() -> u64 {
    5000
}

fn default_max_results() -> usize {
    5
}

fn default_subject_prefix() -> String {
    "speech".to_string()
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
