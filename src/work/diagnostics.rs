//! Rate-limited warnings for providers whose scan and resolution disagree

use ahash::AHashSet;
use std::fmt::Display;

/// Logs each distinct provider + detail combination once
#[derive(Debug)]
pub struct WarnOnce {
    seen: AHashSet<(String, String)>,
    capacity: usize,
    emitted: u64,
    suppressed: u64,
}

impl WarnOnce {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: AHashSet::new(),
            capacity,
            emitted: 0,
            suppressed: 0,
        }
    }

    /// Emit `message` unless this provider + detail was already reported
    ///
    /// Returns true when the warning was logged. Once `capacity` keys are
    /// remembered, new keys are still logged but no longer recorded.
    pub fn warn(&mut self, provider: &str, detail: &str, message: impl Display) -> bool {
        let key = (provider.to_string(), detail.to_string());
        if self.seen.contains(&key) {
            self.suppressed += 1;
            return false;
        }
        if self.seen.len() < self.capacity {
            self.seen.insert(key);
        }
        self.emitted += 1;
        tracing::warn!(provider, "{}", message);
        true
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}
