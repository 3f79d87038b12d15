//! Shared test helpers for license tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use loadframe_crypto::StorageKey;
use loadframe_keystore::{FileVault, RecordStore};
use loadframe_license::{LicenseRecord, LicenseTier};
use std::sync::Arc;
use tempfile::TempDir;

/// Fixed signing secret used across the license tests.
pub const TEST_SECRET: &[u8] = b"loadframe-test-signing-secret-32";

/// Builds a record store over two temp-dir file vaults.
pub fn test_store(primary: &TempDir, fallback: &TempDir) -> Arc<RecordStore> {
    Arc::new(RecordStore::with_backends(
        StorageKey::from_bytes([42u8; 32]),
        Box::new(FileVault::at_root(primary.path())),
        Box::new(FileVault::at_root(fallback.path())),
    ))
}

/// Signs `record` in place with `secret`.
pub fn sign_record(record: &mut LicenseRecord, secret: &[u8]) {
    let tag = loadframe_crypto::sign(secret, record.signing_payload().as_bytes());
    record.signature = hex::encode(tag);
}

/// Builds an unsigned record for `tier` expiring `expires_in_days` from
/// now (`None` = perpetual).
pub fn make_record(tier: LicenseTier, expires_in_days: Option<i64>) -> LicenseRecord {
    let now = Utc::now();
    LicenseRecord {
        license_key: String::new(),
        user_email: "engineer@example.com".to_string(),
        user_name: "Test Engineer".to_string(),
        tier,
        issued_at: now,
        expires_at: expires_in_days.map(|d| now + Duration::days(d)),
        features: tier.features().iter().map(|s| s.to_string()).collect(),
        signature: String::new(),
        hardware_fingerprint: None,
    }
}

/// Signs `record` with `secret` and encodes it as a token, the way the
/// issuance service does.
pub fn encode_token(mut record: LicenseRecord, secret: &[u8]) -> String {
    sign_record(&mut record, secret);
    record.license_key = String::new();
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(&record).unwrap())
}

/// A signed token for `tier`, expiring `expires_in_days` from now.
pub fn make_token(tier: LicenseTier, expires_in_days: Option<i64>) -> String {
    encode_token(make_record(tier, expires_in_days), TEST_SECRET)
}
