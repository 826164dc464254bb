//! Passkey-encrypted text vault with failed-attempt lockout.
//!
//! A [`DataVault`] is one session: it owns the encrypted records, the
//! per-label lockout counters, the admin authority and the label awaiting
//! reauthorization. Nothing outlives the value.

mod admin;
mod config;
pub mod crypto;
mod error;
mod lockout;
mod vault;

pub use crate::admin::{AdminAuthority, AdminSecret, DEFAULT_ADMIN_SECRET, reauthorize};
pub use crate::config::Config;
pub use crate::error::{CryptoError, VaultError};
pub use crate::lockout::{DEFAULT_MAX_ATTEMPTS, LockoutState, LockoutTracker};
pub use crate::vault::{VaultRecord, VaultStore};

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

pub struct DataVault {
    store: VaultStore,
    lockout: LockoutTracker,
    authority: Box<dyn AdminAuthority>,
    config: Config,
    pending_reauth: Option<String>,
}

impl Default for DataVault {
    fn default() -> Self {
        Self::new()
    }
}

impl DataVault {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_authority(config, AdminSecret::default())
    }

    pub fn with_authority(config: Config, authority: impl AdminAuthority + 'static) -> Self {
        Self {
            store: VaultStore::new(),
            lockout: LockoutTracker::new(config.max_attempts()),
            authority: Box::new(authority),
            config,
            pending_reauth: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Encrypt `plaintext` under `passkey` and keep it under `label`,
    /// replacing any previous record. Returns the ciphertext token.
    pub fn store(&mut self, label: &str, plaintext: &str, passkey: &str) -> Result<String, VaultError> {
        if label.is_empty() {
            return Err(VaultError::Validation("label"));
        }
        if plaintext.is_empty() {
            return Err(VaultError::Validation("data"));
        }
        if passkey.is_empty() {
            return Err(VaultError::Validation("passkey"));
        }

        let ciphertext = crypto::encrypt(plaintext, passkey).map_err(VaultError::Encryption)?;
        let replaced = self
            .store
            .put(label, ciphertext.clone(), crypto::hash_passkey(passkey));

        info!(label, replaced, "stored encrypted data");
        Ok(ciphertext)
    }

    /// Decrypt the data stored under `label`.
    ///
    /// A locked label is refused before the passkey is looked at. A passkey
    /// that does not match the stored hash counts as a failed attempt.
    pub fn retrieve(&mut self, label: &str, passkey: &str) -> Result<Zeroizing<String>, VaultError> {
        if self.lockout.observe(label).is_locked() {
            warn!(label, "retrieval refused: label is locked");
            self.pending_reauth = Some(label.to_string());
            return Err(VaultError::LockedOut(label.to_string()));
        }

        let record = self
            .store
            .get(label)
            .ok_or_else(|| VaultError::NotFound(label.to_string()))?;

        if !record.verification().matches(&crypto::hash_passkey(passkey)) {
            let attempts_remaining = self.register_failure(label);
            warn!(label, attempts_remaining, "incorrect passkey");
            return Err(VaultError::WrongPasskey { attempts_remaining });
        }

        let decrypted = match self.config.token_ttl() {
            Some(ttl) => crypto::decrypt_with_ttl(record.ciphertext(), passkey, ttl),
            None => crypto::decrypt(record.ciphertext(), passkey),
        };
        match decrypted {
            Ok(plaintext) => {
                self.lockout.record_success(label);
                info!(label, "retrieved data");
                Ok(plaintext)
            }
            Err(err) => {
                if self.config.count_decryption_failures() {
                    self.register_failure(label);
                }
                warn!(label, error = %err, "passkey matched but decryption failed");
                Err(VaultError::DecryptionFailure(err))
            }
        }
    }

    fn register_failure(&mut self, label: &str) -> u32 {
        let remaining = self.lockout.record_failure(label);
        if remaining == 0 {
            warn!(label, "label locked after too many failed attempts");
            self.pending_reauth = Some(label.to_string());
        }
        remaining
    }

    /// Reset the lockout of the most recently locked label.
    ///
    /// Returns the unlocked label, or `None` when no lockout was pending.
    pub fn reauthorize(&mut self, admin_secret: &str) -> Result<Option<String>, VaultError> {
        let Some(label) = self.pending_reauth.clone() else {
            if !self.authority.verify(admin_secret) {
                warn!("admin reauthorization rejected");
                return Err(VaultError::WrongAdminSecret);
            }
            debug!("admin reauthorization with no pending lockout");
            return Ok(None);
        };

        self.reauthorize_label(&label, admin_secret)?;
        Ok(Some(label))
    }

    /// Reset the lockout of `label`.
    pub fn reauthorize_label(&mut self, label: &str, admin_secret: &str) -> Result<(), VaultError> {
        if !reauthorize(self.authority.as_ref(), &mut self.lockout, label, admin_secret) {
            warn!(label, "admin reauthorization rejected");
            return Err(VaultError::WrongAdminSecret);
        }

        if self.pending_reauth.as_deref() == Some(label) {
            self.pending_reauth = None;
        }
        info!(label, "lockout reset by admin");
        Ok(())
    }

    /// Label awaiting reauthorization, if any.
    pub fn pending_reauthorization(&self) -> Option<&str> {
        self.pending_reauth.as_deref()
    }

    pub fn remove(&mut self, label: &str) -> Result<(), VaultError> {
        self.store.remove(label)?;
        info!(label, "removed record");
        Ok(())
    }

    pub fn record(&self, label: &str) -> Option<&VaultRecord> {
        self.store.get(label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.store.labels()
    }

    pub fn lockout_state(&self, label: &str) -> LockoutState {
        self.lockout.state(label)
    }

    pub fn locked_labels(&self) -> Vec<&str> {
        self.lockout.locked_labels()
    }
}
