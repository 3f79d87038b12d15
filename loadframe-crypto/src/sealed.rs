//! Record sealing with ChaCha20-Poly1305.
//!
//! Every record the keystore persists passes through `seal`/`open`; nothing
//! is written to the OS keychain or disk in plaintext.

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::StorageKey;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// A sealed record: nonce plus ciphertext (auth tag included).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SealedBlob {
    /// The nonce used for sealing (unique per seal).
    pub nonce: [u8; NONCE_SIZE],
    /// The ciphertext, auth tag appended.
    pub ciphertext: Vec<u8>,
}

impl SealedBlob {
    /// Returns the total size of the sealed record.
    pub fn len(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }

    /// Returns true if the ciphertext is empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Encodes to base64 for backends that store strings.
    pub fn to_base64(&self) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine};
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        STANDARD.encode(&bytes)
    }

    /// Decodes the base64 transport form.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        use base64::{engine::general_purpose::STANDARD, Engine};
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::Unseal(format!("invalid base64: {}", e)))?;

        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Unseal("sealed record too short".to_string()));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..NONCE_SIZE]);
        let ciphertext = bytes[NONCE_SIZE..].to_vec();

        Ok(Self { nonce, ciphertext })
    }
}

/// Seals `plaintext` under `key` with a fresh random nonce.
///
/// # Errors
///
/// Returns an error if the AEAD backend rejects the operation.
pub fn seal(key: &StorageKey, plaintext: &[u8]) -> CryptoResult<SealedBlob> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Seal(e.to_string()))?;

    Ok(SealedBlob {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Opens a sealed record.
///
/// # Errors
///
/// Returns an error if the key is wrong or the record was tampered with.
pub fn open(key: &StorageKey, blob: &SealedBlob) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::from_slice(&blob.nonce);

    cipher
        .decrypt(nonce, blob.ciphertext.as_ref())
        .map_err(|_| CryptoError::Unseal("wrong key or tampered record".to_string()))
}
