//! Error types returned by the vault.
//!
//! Crypto failures are kept deliberately vague so they cannot serve as an
//! oracle on why a token was rejected.

use thiserror::Error;

/// Failure of the cipher layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("OS random generator unavailable")]
    Rng,

    #[error("encryption failed")]
    Encrypt,

    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    #[error("token expired")]
    Expired,

    /// Wrong key or tampered data.
    #[error("invalid passkey or corrupted data")]
    Authentication,

    #[error("decrypted data is not valid UTF-8")]
    InvalidUtf8,
}

/// Outcome of a vault operation that did not succeed.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("{0} must not be empty")]
    Validation(&'static str),

    #[error("no data stored under '{0}'")]
    NotFound(String),

    #[error("too many failed attempts for '{0}'; reauthorize with the admin secret")]
    LockedOut(String),

    #[error("incorrect passkey, {attempts_remaining} attempt(s) left")]
    WrongPasskey { attempts_remaining: u32 },

    /// The passkey verified but the ciphertext did not decrypt.
    #[error("decryption failed")]
    DecryptionFailure(#[source] CryptoError),

    #[error("incorrect admin secret")]
    WrongAdminSecret,

    #[error("failed to encrypt data")]
    Encryption(#[source] CryptoError),

    #[error("invalid configuration: {0}")]
    Config(String),
}
