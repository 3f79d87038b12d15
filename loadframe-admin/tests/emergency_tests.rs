mod common;

use chrono::{Duration, Utc};
use common::test_center;
use loadframe_admin::{
    AdminPermission, AuditAction, EmergencyRequest, SESSION_TTL_SECS,
};

fn plausible_proof() -> String {
    // 80 chars of base64 alphabet, standing in for an exported assertion.
    "QmFzZTY0S2V5UHJvb2Y0".repeat(4)
}

fn valid_request() -> EmergencyRequest {
    EmergencyRequest {
        user_id: "admin-1".to_string(),
        reason: "Primary yubikey lost during site visit, need account recovery".to_string(),
        requested_permissions: vec!["user_recovery".to_string(), "emergency_unlock".to_string()],
        hardware_key_proof: plausible_proof(),
        contact_info: "ops@loadframe.example".to_string(),
    }
}

// ── Happy path ───────────────────────────────────────────────────

#[test]
fn valid_request_opens_an_emergency_session() {
    let rig = test_center();
    let outcome = rig
        .center
        .emergency()
        .request_access(valid_request(), "203.0.113.9", "recovery-portal/1.2")
        .unwrap();

    assert!(outcome.valid);
    assert!(outcome.emergency_access);
    assert_eq!(
        outcome.permissions,
        vec![AdminPermission::UserRecovery, AdminPermission::EmergencyUnlock]
    );

    let session_id = outcome.session_id.unwrap();
    let check = rig.center.sessions().validate_session(&session_id);
    assert!(check.valid);
    // The session carries only the reduced set, not full admin.
    assert_eq!(check.permissions.unwrap().len(), 2);
}

#[test]
fn single_permission_request_grants_exactly_that() {
    let rig = test_center();
    let mut request = valid_request();
    request.requested_permissions = vec!["user_recovery".to_string()];

    let outcome = rig
        .center
        .emergency()
        .request_access(request, "203.0.113.9", "recovery-portal/1.2")
        .unwrap();
    assert!(outcome.valid);
    assert_eq!(outcome.permissions, vec![AdminPermission::UserRecovery]);
}

#[test]
fn emergency_sessions_expire_like_normal_ones() {
    let rig = test_center();
    let start = Utc::now();
    let outcome = rig
        .center
        .emergency()
        .request_access_at(valid_request(), "203.0.113.9", "recovery-portal/1.2", start)
        .unwrap();
    let session_id = outcome.session_id.unwrap();

    let almost = start + Duration::seconds(SESSION_TTL_SECS - 1);
    assert!(rig.center.sessions().validate_session_at(&session_id, almost).valid);

    let late = start + Duration::seconds(SESSION_TTL_SECS + 1);
    let check = rig.center.sessions().validate_session_at(&session_id, late);
    assert!(!check.valid);
    assert_eq!(check.reason.as_deref(), Some("Session expired"));
}

// ── Validation order: reason, permissions, proof ─────────────────

#[test]
fn short_reason_is_rejected() {
    let rig = test_center();
    let mut request = valid_request();
    request.reason = "lost key".to_string();

    let outcome = rig
        .center
        .emergency()
        .request_access(request, "203.0.113.9", "recovery-portal/1.2")
        .unwrap();
    assert!(!outcome.valid);
    assert!(outcome.reason.as_deref().unwrap().contains("between 10 and 500"));
    assert!(outcome.session_id.is_none());
}

#[test]
fn oversized_reason_is_rejected() {
    let rig = test_center();
    let mut request = valid_request();
    request.reason = "x".repeat(501);

    let outcome = rig
        .center
        .emergency()
        .request_access(request, "203.0.113.9", "recovery-portal/1.2")
        .unwrap();
    assert!(!outcome.valid);
}

#[test]
fn boundary_reason_lengths_are_accepted() {
    let rig = test_center();

    let mut request = valid_request();
    request.reason = "x".repeat(10);
    assert!(rig
        .center
        .emergency()
        .request_access(request, "203.0.113.9", "recovery-portal/1.2")
        .unwrap()
        .valid);

    let mut request = valid_request();
    request.reason = "x".repeat(500);
    assert!(rig
        .center
        .emergency()
        .request_access(request, "203.0.113.9", "recovery-portal/1.2")
        .unwrap()
        .valid);
}

#[test]
fn ineligible_permission_rejects_the_whole_request() {
    // Asking for an ineligible permission is a rejection, never a session
    // with the bad entry silently dropped.
    let rig = test_center();
    let mut request = valid_request();
    request.requested_permissions =
        vec!["user_recovery".to_string(), "delete_all_users".to_string()];

    let outcome = rig
        .center
        .emergency()
        .request_access(request, "203.0.113.9", "recovery-portal/1.2")
        .unwrap();
    assert!(!outcome.valid);
    assert!(outcome.reason.as_deref().unwrap().contains("delete_all_users"));
    assert!(outcome.session_id.is_none());
    assert!(outcome.permissions.is_empty());
}

#[test]
fn full_admin_permissions_are_not_emergency_eligible() {
    // Even real permissions are rejected when outside the eligible subset.
    let rig = test_center();
    let mut request = valid_request();
    request.requested_permissions = vec!["system_config".to_string()];

    let outcome = rig
        .center
        .emergency()
        .request_access(request, "203.0.113.9", "recovery-portal/1.2")
        .unwrap();
    assert!(!outcome.valid);
    assert!(outcome.reason.as_deref().unwrap().contains("system_config"));
}

#[test]
fn empty_permission_list_is_rejected() {
    let rig = test_center();
    let mut request = valid_request();
    request.requested_permissions = Vec::new();

    let outcome = rig
        .center
        .emergency()
        .request_access(request, "203.0.113.9", "recovery-portal/1.2")
        .unwrap();
    assert!(!outcome.valid);
}

#[test]
fn short_proof_is_rejected() {
    let rig = test_center();
    let mut request = valid_request();
    request.hardware_key_proof = "dG9vc2hvcnQ".to_string();

    let outcome = rig
        .center
        .emergency()
        .request_access(request, "203.0.113.9", "recovery-portal/1.2")
        .unwrap();
    assert!(!outcome.valid);
    assert!(outcome.reason.as_deref().unwrap().contains("proof"));
}

#[test]
fn proof_with_non_base64_bytes_is_rejected() {
    let rig = test_center();
    let mut request = valid_request();
    request.hardware_key_proof = format!("{}!!##", "A".repeat(70));

    let outcome = rig
        .center
        .emergency()
        .request_access(request, "203.0.113.9", "recovery-portal/1.2")
        .unwrap();
    assert!(!outcome.valid);
}

#[test]
fn reason_check_runs_before_permission_check() {
    // Both the reason and the permissions are bad; the reason failure wins.
    let rig = test_center();
    let mut request = valid_request();
    request.reason = "short".to_string();
    request.requested_permissions = vec!["delete_all_users".to_string()];

    let outcome = rig
        .center
        .emergency()
        .request_access(request, "203.0.113.9", "recovery-portal/1.2")
        .unwrap();
    assert!(outcome.reason.as_deref().unwrap().contains("between 10 and 500"));
}

// ── Interaction with normal sessions ─────────────────────────────

#[test]
fn emergency_sessions_do_not_consume_the_normal_cap() {
    use common::{keypair, register, signed_attempt};
    use loadframe_admin::MAX_SESSIONS_PER_USER;

    let rig = test_center();
    let key = keypair(1);
    let registered_id = register(&rig.center, "admin-1", &key);

    // Emergency session first.
    assert!(rig
        .center
        .emergency()
        .request_access(valid_request(), "203.0.113.9", "recovery-portal/1.2")
        .unwrap()
        .valid);

    // The full normal quota is still available.
    for _ in 0..MAX_SESSIONS_PER_USER {
        assert!(rig
            .center
            .sessions()
            .authenticate(signed_attempt("admin-1", &registered_id, &key))
            .unwrap()
            .valid);
    }
}

// ── Audit visibility ─────────────────────────────────────────────

#[test]
fn every_emergency_outcome_is_audited() {
    let rig = test_center();

    rig.center
        .emergency()
        .request_access(valid_request(), "203.0.113.9", "recovery-portal/1.2")
        .unwrap();

    let mut denied = valid_request();
    denied.reason = "nope".to_string();
    rig.center
        .emergency()
        .request_access(denied, "203.0.113.9", "recovery-portal/1.2")
        .unwrap();

    let entries = rig.center.audit().recent(10);
    let emergency: Vec<_> = entries
        .iter()
        .filter(|e| e.action == AuditAction::EmergencyAccess)
        .collect();
    assert_eq!(emergency.len(), 2);
    assert!(emergency.iter().any(|e| e.success));
    assert!(emergency.iter().any(|e| !e.success));

    // The granted entry records the justification and contact, but never
    // the proof material.
    let granted = emergency.iter().find(|e| e.success).unwrap();
    assert!(granted.context.contains("account recovery"));
    assert!(granted.context.contains("ops@loadframe.example"));
    assert!(!granted.context.contains(&plausible_proof()));
}
