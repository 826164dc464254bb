use super::{NONCE_LEN, TAG_LEN, TIME_LEN, VER_LEN};
use crate::error::CryptoError;

pub const VERSION_V1: u8 = 1;

/// Fixed-size prefix of every token. Authenticated as associated data, so
/// the issue time cannot be altered without breaking decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    version: u8,
    issued_at: u64,
    nonce: [u8; NONCE_LEN],
}

impl TokenHeader {
    pub const LEN: usize = VER_LEN + TIME_LEN + NONCE_LEN;

    pub fn new(issued_at: u64, nonce: [u8; NONCE_LEN]) -> Self {
        Self {
            version: VERSION_V1,
            issued_at,
            nonce,
        }
    }

    /// Unix seconds at which the token was produced.
    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::LEN);

        buf.push(self.version);
        buf.extend_from_slice(&self.issued_at.to_be_bytes());
        buf.extend_from_slice(&self.nonce);

        buf
    }

    /// Parse the header and return it with the offset of the ciphertext.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), CryptoError> {
        if data.len() < Self::LEN + TAG_LEN {
            return Err(CryptoError::MalformedToken("too short"));
        }

        let version = data[0];
        if version != VERSION_V1 {
            return Err(CryptoError::MalformedToken("unsupported version"));
        }

        let mut offset = VER_LEN;
        let issued_at = u64::from_be_bytes(
            data[offset..offset + TIME_LEN]
                .try_into()
                .map_err(|_| CryptoError::MalformedToken("invalid timestamp"))?,
        );
        offset += TIME_LEN;

        let nonce: [u8; NONCE_LEN] = data[offset..offset + NONCE_LEN]
            .try_into()
            .map_err(|_| CryptoError::MalformedToken("invalid nonce length"))?;
        offset += NONCE_LEN;

        Ok((
            TokenHeader {
                version,
                issued_at,
                nonce,
            },
            offset,
        ))
    }
}
