//! Error types for the secure record store.

use thiserror::Error;

/// Result type for keystore operations.
pub type KeystoreResult<T> = Result<T, KeystoreError>;

/// Errors that can occur in the secure record store.
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// A secret backend rejected the operation.
    #[error("secret backend error: {0}")]
    Backend(String),

    /// Neither the OS keychain nor the file vault could take the write.
    #[error("no secret backend available (OS keychain and file vault both failed)")]
    Unavailable,

    /// Sealing or unsealing failed (wrong key or tampered record).
    #[error(transparent)]
    Crypto(#[from] loadframe_crypto::CryptoError),

    /// Filesystem error in the file vault.
    #[error("file vault I/O error: {0}")]
    Io(#[from] std::io::Error),
}
