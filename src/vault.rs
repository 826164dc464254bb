use crate::crypto::VerificationHash;
use crate::error::VaultError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// In-memory map from label to encrypted record.
#[derive(Debug, Default)]
pub struct VaultStore {
    records: HashMap<String, VaultRecord>,
}

/// A ciphertext and the hash of the passkey it was sealed under.
#[derive(Debug, Clone)]
pub struct VaultRecord {
    label: String,
    ciphertext: String,
    verification: VerificationHash,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

impl VaultRecord {
    pub(crate) fn new(label: String, ciphertext: String, verification: VerificationHash) -> Self {
        let now = Utc::now();
        Self {
            label,
            ciphertext,
            verification,
            created: now,
            updated: now,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    pub fn verification(&self) -> &VerificationHash {
        &self.verification
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    fn replace(&mut self, ciphertext: String, verification: VerificationHash) {
        self.ciphertext = ciphertext;
        self.verification = verification;
        self.updated = Utc::now();
    }
}

impl VaultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `label`. Returns `true` when an
    /// existing record was replaced.
    pub fn put(&mut self, label: &str, ciphertext: String, verification: VerificationHash) -> bool {
        match self.records.get_mut(label) {
            Some(record) => {
                record.replace(ciphertext, verification);
                true
            }
            None => {
                self.records.insert(
                    label.to_string(),
                    VaultRecord::new(label.to_string(), ciphertext, verification),
                );
                false
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&VaultRecord> {
        self.records.get(label)
    }

    pub fn remove(&mut self, label: &str) -> Result<VaultRecord, VaultError> {
        self.records
            .remove(label)
            .ok_or_else(|| VaultError::NotFound(label.to_string()))
    }

    /// Stored labels in sorted order.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.records.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }
}
