use std::time::Duration;

use crate::error::VaultError;
use crate::lockout::DEFAULT_MAX_ATTEMPTS;

/// Tunables of a vault session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    max_attempts: u32,
    token_ttl: Option<Duration>,
    count_decryption_failures: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            // tokens never expire
            token_ttl: None,
            count_decryption_failures: false,
        }
    }
}

impl Config {
    pub fn new(
        max_attempts: u32,
        token_ttl: Option<Duration>,
        count_decryption_failures: bool,
    ) -> Result<Self, VaultError> {
        let config = Self {
            max_attempts,
            token_ttl,
            count_decryption_failures,
        };
        config.validate()?;
        Ok(config)
    }

    /// Failed passkey attempts allowed before a label locks.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Maximum token age accepted on retrieval.
    pub fn token_ttl(&self) -> Option<Duration> {
        self.token_ttl
    }

    /// Whether a decryption failure after a matching passkey hash counts
    /// as a failed attempt.
    pub fn count_decryption_failures(&self) -> bool {
        self.count_decryption_failures
    }

    pub fn validate(&self) -> Result<(), VaultError> {
        if self.max_attempts < 1 {
            return Err(VaultError::Config("max attempts must be >= 1".into()));
        }
        if self.token_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(VaultError::Config("token ttl must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_behavior() {
        let config = Config::default();
        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.token_ttl(), None);
        assert!(!config.count_decryption_failures());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_values_fail_gracefully() {
        assert!(Config::new(0, None, false).is_err());
        assert!(Config::new(3, Some(Duration::ZERO), false).is_err());
        assert!(Config::new(5, Some(Duration::from_secs(60)), true).is_ok());
    }
}
