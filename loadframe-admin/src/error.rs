//! Error types for the admin security crate.
//!
//! Expected denials (bad signature, unknown key, cap reached) live in the
//! outcome structs; these errors cover the genuinely exceptional paths.

use thiserror::Error;

/// Result type for admin security operations.
pub type AdminResult<T> = Result<T, AdminError>;

/// Hard failures in the admin security components.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The secure record store failed on both backends.
    #[error("credential storage error: {0}")]
    Storage(#[from] loadframe_keystore::KeystoreError),

    /// A crypto primitive failed outright.
    #[error(transparent)]
    Crypto(#[from] loadframe_crypto::CryptoError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
