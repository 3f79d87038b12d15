//! Error types for the licensing crate.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Token is not decodable into a license record.
    #[error("invalid license token format: {0}")]
    InvalidFormat(String),

    /// Keyed-hash signature verification failed.
    #[error("license signature invalid")]
    InvalidSignature,

    /// The secure record store failed on both backends.
    #[error("license storage error: {0}")]
    Storage(#[from] loadframe_keystore::KeystoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
