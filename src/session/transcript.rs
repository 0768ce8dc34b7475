/// Kind of fragment an engine delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Live hypothesis, subject to revision
    Partial,
    /// Finalized text for an utterance
    Final,
}

/// Whether applying a fragment changed the observable transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Changed,
    Unchanged,
}

/// Folds a stream of partial/final fragments into one growing transcript.
///
/// Committed text is append-only and space-joined. The pending fragment is
/// the engine's live hypothesis for the current utterance: a new partial
/// replaces it in place, unless the previous partial was empty (the
/// engine's pause marker), in which case the pending text is committed and
/// a new segment begins.
///
/// Pure state: no timers, no backends, no notification delivery.
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    committed: String,
    pending: String,
    in_silence_gap: bool,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all state for a fresh session.
    pub fn reset(&mut self) {
        self.committed.clear();
        self.pending.clear();
        self.in_silence_gap = false;
    }

    /// Merge one fragment, reporting whether the observable transcript
    /// changed. An unchanged outcome means the caller should not notify.
    pub fn apply(&mut self, fragment: &str, kind: FragmentKind) -> MergeOutcome {
        let before = self.observable();

        match kind {
            FragmentKind::Partial if fragment.is_empty() => {
                // Pause marker: remember the gap, keep the text as-is.
                self.in_silence_gap = true;
            }
            FragmentKind::Partial => {
                if self.in_silence_gap {
                    // New segment: the previous hypothesis is as good as
                    // it will get, commit it and start over.
                    self.in_silence_gap = false;
                    let previous = std::mem::take(&mut self.pending);
                    self.commit(&previous);
                    self.pending = fragment.to_string();
                } else if self.pending != fragment {
                    self.pending = fragment.to_string();
                }
            }
            FragmentKind::Final => {
                if fragment.is_empty() {
                    // Engine returned nothing; keep what was heard.
                    let previous = std::mem::take(&mut self.pending);
                    self.commit(&previous);
                } else {
                    self.pending.clear();
                    self.commit(fragment);
                }
                self.in_silence_gap = false;
            }
        }

        if self.observable() == before {
            MergeOutcome::Unchanged
        } else {
            MergeOutcome::Changed
        }
    }

    fn commit(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.committed.is_empty() {
            self.committed.push(' ');
        }
        self.committed.push_str(text);
    }

    /// Finalized text so far.
    pub fn committed(&self) -> &str {
        &self.committed
    }

    /// Full transcript as a listener should see it right now: committed
    /// text, space-joined with the pending hypothesis if there is one.
    pub fn observable(&self) -> String {
        if self.pending.is_empty() {
            self.committed.clone()
        } else if self.committed.is_empty() {
            self.pending.clone()
        } else {
            format!("{} {}", self.committed, self.pending)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.pending.is_empty()
    }
}
