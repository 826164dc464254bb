//! Per-label failed-attempt counting.
//!
//! Each label is an independent state machine:
//!
//! ```text
//! Open(0) --failure--> Open(1) --failure--> ... --failure--> Locked(max)
//!    ^                                                          |
//!    +----------------- success / reset ------------------------+
//! ```
//!
//! Unseen labels behave as `Open(0)`.

use serde::Serialize;
use std::collections::HashMap;

/// Failures allowed before a label locks.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockoutState {
    Open { failed_attempts: u32 },
    Locked { failed_attempts: u32 },
}

impl LockoutState {
    pub fn failed_attempts(&self) -> u32 {
        match *self {
            LockoutState::Open { failed_attempts } | LockoutState::Locked { failed_attempts } => {
                failed_attempts
            }
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, LockoutState::Locked { .. })
    }
}

#[derive(Debug)]
pub struct LockoutTracker {
    max_attempts: u32,
    failures: HashMap<String, u32>,
}

impl Default for LockoutTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl LockoutTracker {
    /// `max_attempts` below 1 is treated as 1.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            failures: HashMap::new(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn classify(&self, failed_attempts: u32) -> LockoutState {
        if failed_attempts >= self.max_attempts {
            LockoutState::Locked { failed_attempts }
        } else {
            LockoutState::Open { failed_attempts }
        }
    }

    /// Current state without materializing an entry.
    pub fn state(&self, label: &str) -> LockoutState {
        self.classify(self.failures.get(label).copied().unwrap_or(0))
    }

    /// Current state, creating the zero entry for an unseen label.
    pub fn observe(&mut self, label: &str) -> LockoutState {
        let failed = *self.failures.entry(label.to_string()).or_insert(0);
        self.classify(failed)
    }

    pub fn is_locked(&self, label: &str) -> bool {
        self.state(label).is_locked()
    }

    /// Count a failed attempt and return how many remain before lockout.
    pub fn record_failure(&mut self, label: &str) -> u32 {
        let max = self.max_attempts;
        let failed = self.failures.entry(label.to_string()).or_insert(0);
        *failed = failed.saturating_add(1).min(max);
        max - *failed
    }

    pub fn record_success(&mut self, label: &str) {
        self.failures.insert(label.to_string(), 0);
    }

    pub fn reset(&mut self, label: &str) {
        self.failures.insert(label.to_string(), 0);
    }

    /// Labels currently locked, sorted.
    pub fn locked_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .failures
            .iter()
            .filter(|&(_, &n)| n >= self.max_attempts)
            .map(|(label, _)| label.as_str())
            .collect();
        labels.sort_unstable();
        labels
    }

    #[cfg(test)]
    pub(crate) fn is_tracked(&self, label: &str) -> bool {
        self.failures.contains_key(label)
    }
}
