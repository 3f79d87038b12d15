//! License token decoding and signature verification.
//!
//! Tokens are produced by the issuance service as
//! `base64url(record_json)`, where the record carries a hex HMAC-SHA256
//! tag over its canonical field string. Decoding and verification happen
//! here; policy checks (binding, expiry) live in the manager.

use crate::error::{LicenseError, LicenseResult};
use crate::record::LicenseRecord;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// Embedded product signing secret for license verification (32 bytes).
const LICENSE_SIGNING_SECRET: [u8; 32] = [
    174, 33, 250, 7, 129, 88, 64, 201, 18, 155, 43, 96, 233, 110, 5, 147,
    72, 219, 160, 31, 84, 205, 122, 9, 188, 57, 240, 103, 26, 145, 78, 211,
];

/// Decodes and verifies a license token using the embedded signing secret.
///
/// # Errors
///
/// Returns [`LicenseError::InvalidFormat`] when the token is not decodable
/// and [`LicenseError::InvalidSignature`] when the tag does not match.
pub fn parse(token: &str) -> LicenseResult<LicenseRecord> {
    parse_with_secret(token, &LICENSE_SIGNING_SECRET)
}

/// Decodes and verifies a license token using a caller-supplied secret.
/// Used by tests with a generated secret.
pub fn parse_with_secret(token: &str, secret: &[u8]) -> LicenseResult<LicenseRecord> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(LicenseError::InvalidFormat("empty token".to_string()));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| LicenseError::InvalidFormat(format!("invalid base64: {e}")))?;

    let mut record: LicenseRecord = serde_json::from_slice(&payload)
        .map_err(|e| LicenseError::InvalidFormat(format!("invalid payload JSON: {e}")))?;

    if !record.verify_signature(secret) {
        return Err(LicenseError::InvalidSignature);
    }

    record.license_key = trimmed.to_string();
    Ok(record)
}

/// Returns the embedded signing secret. Crate-internal; the manager uses
/// it as its default verification secret.
pub(crate) fn default_secret() -> &'static [u8] {
    &LICENSE_SIGNING_SECRET
}
