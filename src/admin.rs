//! Administrative reauthorization of locked labels.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::lockout::LockoutTracker;

/// Admin secret used when none is configured.
pub const DEFAULT_ADMIN_SECRET: &str = "admin123";

/// Decides whether a provided admin secret is valid.
pub trait AdminAuthority: Send + Sync {
    fn verify(&self, provided: &str) -> bool;
}

/// A single shared admin secret held in memory.
pub struct AdminSecret(Zeroizing<String>);

impl AdminSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }
}

impl Default for AdminSecret {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_SECRET)
    }
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret(<redacted>)")
    }
}

impl AdminAuthority for AdminSecret {
    fn verify(&self, provided: &str) -> bool {
        // Compare fixed-size digests so the secret length does not leak.
        let expected = Sha256::digest(self.0.as_bytes());
        let provided = Sha256::digest(provided.as_bytes());
        expected.as_slice().ct_eq(provided.as_slice()).into()
    }
}

/// Reset the lockout of `label` if `provided` is accepted by `authority`.
/// Nothing is mutated on rejection.
pub fn reauthorize(
    authority: &dyn AdminAuthority,
    tracker: &mut LockoutTracker,
    label: &str,
    provided: &str,
) -> bool {
    if !authority.verify(provided) {
        return false;
    }
    tracker.reset(label);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locked_tracker() -> LockoutTracker {
        let mut tracker = LockoutTracker::default();
        for _ in 0..3 {
            tracker.record_failure("alice");
        }
        tracker
    }

    #[test]
    fn default_secret_verifies() {
        let secret = AdminSecret::default();
        assert!(secret.verify("admin123"));
        assert!(!secret.verify("admin1234"));
        assert!(!secret.verify(""));
    }

    #[test]
    fn correct_secret_resets_label() {
        let mut tracker = locked_tracker();
        assert!(reauthorize(&AdminSecret::default(), &mut tracker, "alice", "admin123"));
        assert!(!tracker.is_locked("alice"));
    }

    #[test]
    fn wrong_secret_leaves_lockout() {
        let mut tracker = locked_tracker();
        assert!(!reauthorize(&AdminSecret::default(), &mut tracker, "alice", "nope"));
        assert!(tracker.is_locked("alice"));
    }

    #[test]
    fn custom_authority_is_used() {
        struct AllowAll;
        impl AdminAuthority for AllowAll {
            fn verify(&self, _: &str) -> bool {
                true
            }
        }

        let mut tracker = locked_tracker();
        assert!(reauthorize(&AllowAll, &mut tracker, "alice", "anything"));
        assert!(!tracker.is_locked("alice"));
    }

    #[test]
    fn debug_hides_secret() {
        assert!(!format!("{:?}", AdminSecret::new("hunter2")).contains("hunter2"));
    }
}
