use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::info;

/// Opaque reference to a loaded recognition model.
///
/// The controller never looks inside a model; it only swaps which handle is
/// active when the requested language changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    /// Language code this model recognizes (e.g. "en-US")
    pub language: String,
    /// On-disk location, when the engine loads from files
    pub path: Option<PathBuf>,
}

impl ModelHandle {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            path: None,
        }
    }

    pub fn with_path(language: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            language: language.into(),
            path: Some(path.into()),
        }
    }
}

/// Process-scoped map from language code to loaded model.
///
/// Populated once at startup, then read-only from the controller's
/// perspective. `mark_ready` flips the explicit ready flag sessions are
/// gated on.
pub struct ModelRegistry {
    default_language: String,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    models: BTreeMap<String, ModelHandle>,
    ready: bool,
}

impl ModelRegistry {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: default_language.into(),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Register a model under its language code.
    pub fn register(&self, handle: ModelHandle) {
        let mut inner = self.inner.write().unwrap();
        info!(language = %handle.language, "registered recognition model");
        inner.models.insert(handle.language.clone(), handle);
    }

    /// Flip the registry to ready once startup loading is done.
    pub fn mark_ready(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.ready = true;
    }

    pub fn is_ready(&self) -> bool {
        let inner = self.inner.read().unwrap();
        inner.ready && !inner.models.is_empty()
    }

    /// Model loaded for exactly this language code, if any.
    pub fn lookup(&self, language: &str) -> Option<ModelHandle> {
        let inner = self.inner.read().unwrap();
        inner.models.get(language).cloned()
    }

    /// Sorted list of language codes with a loaded model.
    pub fn available_languages(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        inner.models.keys().cloned().collect()
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Normalize a requested language to a supported code.
    ///
    /// Exact match (case-insensitive) wins, then a registered code from the
    /// same locale family (matching primary subtag), otherwise the
    /// configured default.
    pub fn resolve_language(&self, hint: Option<&str>) -> String {
        let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) else {
            return self.default_language.clone();
        };

        let inner = self.inner.read().unwrap();

        if let Some(code) = inner
            .models
            .keys()
            .find(|code| code.eq_ignore_ascii_case(hint))
        {
            return code.clone();
        }

        let family = primary_subtag(hint);
        if let Some(code) = inner
            .models
            .keys()
            .find(|code| primary_subtag(code).eq_ignore_ascii_case(family))
        {
            return code.clone();
        }

        self.default_language.clone()
    }
}

fn primary_subtag(code: &str) -> &str {
    code.split(['-', '_']).next().unwrap_or(code)
}
