//! Digests, keyed signing, and opaque identifiers.
//!
//! License signatures and hardware fingerprints are all built from these
//! functions. Keyed signing is HMAC-SHA256 with the product signing secret;
//! verification uses a constant-time comparison.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Size of an HMAC-SHA256 tag in bytes.
pub const MAC_SIZE: usize = 32;

/// Computes the SHA-256 digest of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes the SHA-256 digest of `data` as a lowercase hex string.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Computes an HMAC-SHA256 tag over `payload` with `secret`.
#[must_use]
pub fn sign(secret: &[u8], payload: &[u8]) -> [u8; MAC_SIZE] {
    // HMAC-SHA256 accepts keys of any length, so this cannot fail.
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.finalize().into_bytes().into()
}

/// Verifies an HMAC-SHA256 `tag` over `payload` with `secret`.
///
/// The comparison is constant-time. Truncated, oversized, or mismatched
/// tags all return `false`.
#[must_use]
pub fn verify(secret: &[u8], payload: &[u8], tag: &[u8]) -> bool {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.verify_slice(tag).is_ok()
}

/// Generates an opaque, unguessable identifier.
///
/// UUID v4 carries 122 bits from the OS RNG; session IDs and registered
/// key IDs come from here so one identifier reveals nothing about another.
#[must_use]
pub fn random_id() -> String {
    Uuid::new_v4().to_string()
}
