//! Hardware-key assertion verification.
//!
//! Verifies the Ed25519 signature an authenticator produces over a
//! challenge. This is the only public-key operation in the trust core.

use crate::error::{CryptoError, CryptoResult};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Length of an Ed25519 public key in bytes.
pub const ED25519_PUBLIC_KEY_LEN: usize = 32;

/// Verifies an Ed25519 assertion `signature` over `message`.
///
/// Malformed key or signature bytes are an error; a well-formed signature
/// that does not match the message is `Ok(false)`.
///
/// # Errors
///
/// Returns an error if `public_key` is not a valid Ed25519 point or
/// `signature` has the wrong length.
pub fn verify_assertion(public_key: &[u8], message: &[u8], signature: &[u8]) -> CryptoResult<bool> {
    let key_bytes: &[u8; ED25519_PUBLIC_KEY_LEN] = public_key.try_into().map_err(|_| {
        CryptoError::MalformedKey(format!(
            "expected {} bytes, got {}",
            ED25519_PUBLIC_KEY_LEN,
            public_key.len()
        ))
    })?;

    let verifying_key = VerifyingKey::from_bytes(key_bytes)
        .map_err(|_| CryptoError::MalformedKey("not a valid Ed25519 point".to_string()))?;

    let signature = Signature::from_slice(signature)
        .map_err(|_| CryptoError::MalformedSignature("invalid signature length".to_string()))?;

    Ok(verifying_key.verify(message, &signature).is_ok())
}
