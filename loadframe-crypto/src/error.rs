//! Error types for the crypto layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Sealing failed.
    #[error("sealing failed: {0}")]
    Seal(String),

    /// Unsealing failed (wrong key or tampered record).
    #[error("unsealing failed: {0}")]
    Unseal(String),

    /// Key bytes do not form a usable public key.
    #[error("malformed public key: {0}")]
    MalformedKey(String),

    /// Signature bytes do not form a usable signature.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
