mod common;

use common::{credential_for, keypair, register, signed_attempt, test_center};
use ed25519_dalek::Signer;
use loadframe_admin::NewKeyCredential;

// ── Registration ─────────────────────────────────────────────────

#[test]
fn register_valid_key() {
    let rig = test_center();
    let key = keypair(1);
    let outcome = rig
        .center
        .registry()
        .register_key("admin-1", credential_for(&key), None)
        .unwrap();
    assert!(outcome.registered);
    assert!(outcome.registered_id.is_some());
    assert!(outcome.reason.is_none());
    assert_eq!(rig.center.registry().registered_count(), 1);
}

#[test]
fn empty_public_key_is_rejected() {
    let rig = test_center();
    let outcome = rig
        .center
        .registry()
        .register_key(
            "admin-1",
            NewKeyCredential {
                key_id: "k".to_string(),
                public_key: Vec::new(),
                algorithm: "ed25519".to_string(),
            },
            None,
        )
        .unwrap();
    assert!(!outcome.registered);
    assert!(outcome.reason.as_deref().unwrap().contains("empty"));
}

#[test]
fn unsupported_algorithm_is_rejected() {
    let rig = test_center();
    let key = keypair(1);
    let outcome = rig
        .center
        .registry()
        .register_key(
            "admin-1",
            NewKeyCredential {
                key_id: "k".to_string(),
                public_key: key.verifying_key().to_bytes().to_vec(),
                algorithm: "INVALID".to_string(),
            },
            None,
        )
        .unwrap();
    assert!(!outcome.registered);
    assert!(outcome
        .reason
        .as_deref()
        .unwrap()
        .contains("Unsupported algorithm"));
}

#[test]
fn wrong_key_length_is_rejected() {
    let rig = test_center();
    let outcome = rig
        .center
        .registry()
        .register_key(
            "admin-1",
            NewKeyCredential {
                key_id: "k".to_string(),
                public_key: vec![1, 2, 3],
                algorithm: "ed25519".to_string(),
            },
            None,
        )
        .unwrap();
    assert!(!outcome.registered);
    assert!(outcome.reason.as_deref().unwrap().contains("32 bytes"));
}

#[test]
fn short_attestation_is_rejected() {
    let rig = test_center();
    let key = keypair(1);
    let outcome = rig
        .center
        .registry()
        .register_key("admin-1", credential_for(&key), Some(&[0xA3, 0x01]))
        .unwrap();
    assert!(!outcome.registered);
    assert!(outcome.reason.as_deref().unwrap().contains("attestation"));
}

#[test]
fn attestation_without_marker_byte_is_rejected() {
    let rig = test_center();
    let key = keypair(1);
    let outcome = rig
        .center
        .registry()
        .register_key("admin-1", credential_for(&key), Some(&[0u8; 64]))
        .unwrap();
    assert!(!outcome.registered);
}

#[test]
fn plausible_attestation_is_accepted() {
    let rig = test_center();
    let key = keypair(1);
    let mut attestation = vec![0xA3];
    attestation.extend_from_slice(&[0x42; 63]);
    let outcome = rig
        .center
        .registry()
        .register_key("admin-1", credential_for(&key), Some(&attestation))
        .unwrap();
    assert!(outcome.registered);
}

#[test]
fn registered_ids_are_opaque_and_distinct() {
    let rig = test_center();
    let a = register(&rig.center, "admin-1", &keypair(1));
    let b = register(&rig.center, "admin-1", &keypair(2));
    assert_ne!(a, b);
    assert!(uuid::Uuid::parse_str(&a).is_ok());
}

// ── Revocation ───────────────────────────────────────────────────

#[test]
fn revoked_key_no_longer_authenticates() {
    let rig = test_center();
    let key = keypair(1);
    let registered_id = register(&rig.center, "admin-1", &key);

    assert!(rig.center.registry().revoke_key(&registered_id).unwrap());

    let outcome = rig
        .center
        .sessions()
        .authenticate(signed_attempt("admin-1", &registered_id, &key))
        .unwrap();
    assert!(!outcome.valid);
    assert!(outcome.reason.as_deref().unwrap().contains("not registered"));
}

#[test]
fn revoking_unknown_key_reports_absence() {
    let rig = test_center();
    assert!(!rig.center.registry().revoke_key("no-such-id").unwrap());
}

// ── Persistence and counters ─────────────────────────────────────

#[test]
fn credentials_survive_restart() {
    let (a, b) = (
        tempfile::TempDir::new().unwrap(),
        tempfile::TempDir::new().unwrap(),
    );
    let key = keypair(1);
    let registered_id = {
        let center = loadframe_admin::SecurityCenter::new(common::test_store(&a, &b));
        register(&center, "admin-1", &key)
    };

    // A fresh process finds the sealed credential in the store.
    let center = loadframe_admin::SecurityCenter::new(common::test_store(&a, &b));
    let outcome = center
        .sessions()
        .authenticate(signed_attempt("admin-1", &registered_id, &key))
        .unwrap();
    assert!(outcome.valid);
}

#[test]
fn counter_advances_on_successful_authentication() {
    let rig = test_center();
    let key = keypair(1);
    let registered_id = register(&rig.center, "admin-1", &key);

    let before = rig.center.registry().lookup(&registered_id).unwrap().counter;
    rig.center
        .sessions()
        .authenticate(signed_attempt("admin-1", &registered_id, &key))
        .unwrap();
    let after = rig.center.registry().lookup(&registered_id).unwrap().counter;
    assert_eq!(after, before + 1);
}

#[test]
fn failed_authentication_does_not_advance_the_counter() {
    let rig = test_center();
    let key = keypair(1);
    let registered_id = register(&rig.center, "admin-1", &key);

    let mut attempt = signed_attempt("admin-1", &registered_id, &key);
    attempt.signature = keypair(9).sign(b"other").to_bytes().to_vec();
    rig.center.sessions().authenticate(attempt).unwrap();

    assert_eq!(rig.center.registry().lookup(&registered_id).unwrap().counter, 0);
}
