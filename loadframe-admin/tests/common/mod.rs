//! Shared test helpers for admin security tests.

#![allow(dead_code)]

use ed25519_dalek::{Signer, SigningKey};
use loadframe_admin::{AuthAttempt, NewKeyCredential, SecurityCenter};
use loadframe_crypto::StorageKey;
use loadframe_keystore::{FileVault, RecordStore};
use std::sync::Arc;
use tempfile::TempDir;

/// A security center over temp-dir file vaults, with the dirs kept alive.
pub struct TestRig {
    pub center: SecurityCenter,
    _dirs: (TempDir, TempDir),
}

pub fn test_store(primary: &TempDir, fallback: &TempDir) -> Arc<RecordStore> {
    Arc::new(RecordStore::with_backends(
        StorageKey::from_bytes([42u8; 32]),
        Box::new(FileVault::at_root(primary.path())),
        Box::new(FileVault::at_root(fallback.path())),
    ))
}

pub fn test_center() -> TestRig {
    let dirs = (TempDir::new().unwrap(), TempDir::new().unwrap());
    let center = SecurityCenter::new(test_store(&dirs.0, &dirs.1));
    TestRig {
        center,
        _dirs: dirs,
    }
}

/// Deterministic Ed25519 key from a one-byte seed.
pub fn keypair(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

/// A well-formed registration credential for `key`.
pub fn credential_for(key: &SigningKey) -> NewKeyCredential {
    NewKeyCredential {
        key_id: "yubikey-slot-1".to_string(),
        public_key: key.verifying_key().to_bytes().to_vec(),
        algorithm: "ed25519".to_string(),
    }
}

/// Registers `key` for `user` and returns the registered ID.
pub fn register(center: &SecurityCenter, user: &str, key: &SigningKey) -> String {
    let outcome = center
        .registry()
        .register_key(user, credential_for(key), None)
        .unwrap();
    assert!(outcome.registered, "{:?}", outcome.reason);
    outcome.registered_id.unwrap()
}

/// Builds an authentication attempt correctly signed by `key`.
pub fn signed_attempt(user: &str, registered_id: &str, key: &SigningKey) -> AuthAttempt {
    let challenge = b"server-issued-challenge".to_vec();
    let client_data = br#"{"origin":"loadframe-admin"}"#.to_vec();

    let mut message = challenge.clone();
    message.extend_from_slice(&client_data);
    let signature = key.sign(&message).to_bytes().to_vec();

    AuthAttempt {
        user_id: user.to_string(),
        registered_id: registered_id.to_string(),
        signature,
        challenge,
        client_data,
        ip_address: "198.51.100.7".to_string(),
        user_agent: "loadframe-admin-cli/0.9".to_string(),
    }
}
