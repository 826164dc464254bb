//! Passkey-based encryption of text into opaque tokens.
//!
//! A token is `header || ciphertext || tag`, URL-safe base64 encoded. See
//! [`TokenHeader`] for the header layout.

use base64::{Engine, engine::general_purpose::URL_SAFE};
use chrono::Utc;
use std::time::Duration;
use zeroize::Zeroizing;

use super::{TokenHeader, aead, derive_key};
use crate::error::CryptoError;

/// Tokens stamped further than this into the future are rejected.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(60);

fn now_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// Encrypt `plaintext` under a key derived from `passkey`.
///
/// Each call draws a fresh nonce, so encrypting the same text twice yields
/// different tokens.
pub fn encrypt(plaintext: &str, passkey: &str) -> Result<String, CryptoError> {
    encrypt_at(plaintext, passkey, now_secs())
}

pub(crate) fn encrypt_at(plaintext: &str, passkey: &str, issued_at: u64) -> Result<String, CryptoError> {
    let key = derive_key(passkey);
    let header = TokenHeader::new(issued_at, aead::generate_nonce()?);

    let mut token = header.to_bytes();
    let ciphertext = aead::seal(key.as_bytes(), header.nonce(), &token, plaintext.as_bytes())?;
    token.extend_from_slice(&ciphertext);

    Ok(URL_SAFE.encode(token))
}

/// Decrypt a token produced by [`encrypt`], regardless of its age.
pub fn decrypt(token: &str, passkey: &str) -> Result<Zeroizing<String>, CryptoError> {
    decrypt_at(token, passkey, None, now_secs())
}

/// Decrypt a token, rejecting it if it is older than `ttl`.
pub fn decrypt_with_ttl(
    token: &str,
    passkey: &str,
    ttl: Duration,
) -> Result<Zeroizing<String>, CryptoError> {
    decrypt_at(token, passkey, Some(ttl), now_secs())
}

fn decrypt_at(
    token: &str,
    passkey: &str,
    ttl: Option<Duration>,
    now: u64,
) -> Result<Zeroizing<String>, CryptoError> {
    let data = URL_SAFE
        .decode(token.trim())
        .map_err(|_| CryptoError::MalformedToken("not base64"))?;

    let (header, offset) = TokenHeader::from_bytes(&data)?;

    if let Some(ttl) = ttl {
        if header.issued_at() > now.saturating_add(MAX_CLOCK_SKEW.as_secs()) {
            return Err(CryptoError::Expired);
        }
        if now.saturating_sub(header.issued_at()) > ttl.as_secs() {
            return Err(CryptoError::Expired);
        }
    }

    let key = derive_key(passkey);
    let plaintext = aead::open(
        key.as_bytes(),
        header.nonce(),
        &data[..offset],
        &data[offset..],
    )?;

    let text = std::str::from_utf8(&plaintext).map_err(|_| CryptoError::InvalidUtf8)?;
    Ok(Zeroizing::new(text.to_owned()))
}
