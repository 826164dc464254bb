use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::KEY_LEN;

const KEY_CONTEXT: &[u8] = b"datavault/v1/encryption-key\0";
const VERIFY_CONTEXT: &[u8] = b"datavault/v1/passkey-verification\0";

/// Symmetric key derived from a passkey. Wiped from memory on drop.
pub struct PassphraseKey(Zeroizing<[u8; KEY_LEN]>);

impl PassphraseKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for PassphraseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PassphraseKey(<redacted>)")
    }
}

/// One-way digest of a passkey, stored next to a ciphertext.
#[derive(Debug, Clone)]
pub struct VerificationHash(String);

impl VerificationHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time equality against another hash.
    pub fn matches(&self, other: &VerificationHash) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Display for VerificationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn digest(context: &[u8], passkey: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(context);
    hasher.update(passkey.as_bytes());
    hasher.finalize().into()
}

/// Derive the encryption key for a passkey.
pub fn derive_key(passkey: &str) -> PassphraseKey {
    PassphraseKey(Zeroizing::new(digest(KEY_CONTEXT, passkey)))
}

/// Hash a passkey for later verification.
pub fn hash_passkey(passkey: &str) -> VerificationHash {
    VerificationHash(hex::encode(digest(VERIFY_CONTEXT, passkey)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::HASH_HEX_LEN;

    #[test]
    fn kdf_is_deterministic() {
        let k1 = derive_key("password");
        let k2 = derive_key("password");

        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn different_passkeys_give_different_keys() {
        let k1 = derive_key("pw1");
        let k2 = derive_key("pw2");

        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn empty_passkey_still_derives() {
        assert_eq!(derive_key("").as_bytes().len(), KEY_LEN);
        assert_eq!(hash_passkey("").as_str().len(), HASH_HEX_LEN);
    }

    #[test]
    fn verification_hash_is_stable_hex() {
        let h1 = hash_passkey("pw1");
        let h2 = hash_passkey("pw1");

        assert_eq!(h1.as_str(), h2.as_str());
        assert_eq!(h1.as_str().len(), HASH_HEX_LEN);
        assert!(h1.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(h1.matches(&h2));
    }

    #[test]
    fn verification_hash_differs_per_passkey() {
        assert!(!hash_passkey("pw1").matches(&hash_passkey("pw2")));
    }

    #[test]
    fn verification_hash_is_not_the_key() {
        let key = derive_key("pw1");
        let hash = hash_passkey("pw1");

        assert_ne!(hex::encode(key.as_bytes()), hash.as_str());
    }

    #[test]
    fn debug_output_hides_key_bytes() {
        let key = derive_key("pw1");
        let rendered = format!("{key:?}");

        assert!(!rendered.contains(&hex::encode(key.as_bytes())));
        assert!(rendered.contains("redacted"));
    }
}
