// Process-wide action log - in-memory append-only sink for moderation tags.

use crate::core::automod::ActionLog;
use std::sync::Mutex;

/// Append-only list of tag strings, shared across the whole process.
///
/// Appends take a short lock, so concurrent events cannot interleave within
/// a single entry. Nothing is persisted; the log lives and dies with the
/// process.
#[derive(Default)]
pub struct InMemoryActionLog {
    entries: Mutex<Vec<String>>,
}

impl InMemoryActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all entries so far, oldest first.
    #[allow(dead_code)]
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().expect("action log poisoned").clone()
    }
}

impl ActionLog for InMemoryActionLog {
    fn append(&self, tag: String) {
        self.entries.lock().expect("action log poisoned").push(tag);
    }
}
