//! Cryptographic primitives for the vault.
//!
//! Provides passkey key derivation, authenticated encryption, and the token
//! format wrapping ciphertexts handed back to callers.

pub mod aead;
pub mod cipher;
pub mod kdf;
pub mod token;

pub use cipher::{decrypt, decrypt_with_ttl, encrypt};
pub use kdf::{PassphraseKey, VerificationHash, derive_key, hash_passkey};
pub use token::TokenHeader;

/// Length of the nonce (24 bytes for XChaCha20-Poly1305).
pub const NONCE_LEN: usize = 24;
/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the Poly1305 authentication tag.
pub const TAG_LEN: usize = 16;
/// Length of the version field (1 byte).
pub const VER_LEN: usize = 1;
/// Length of the issue timestamp field (8 bytes, big endian seconds).
pub const TIME_LEN: usize = 8;
/// Length of a hex encoded verification hash.
pub const HASH_HEX_LEN: usize = 64;
