//! Break-glass emergency access.
//!
//! Used when normal key access is unavailable: the hardware-key proof only
//! gets a sanity check, not full signature verification, and in exchange
//! the grantable permissions are a fixed reduced subset and every request
//! is the loudest event in the audit log.

use crate::audit::{AuditAction, AuditLog};
use crate::error::AdminResult;
use crate::permissions::AdminPermission;
use crate::session::{AuthOutcome, SessionManager};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Minimum justification length in characters.
pub const MIN_REASON_LEN: usize = 10;

/// Maximum justification length in characters.
pub const MAX_REASON_LEN: usize = 500;

/// Minimum plausible hardware-key proof length.
const MIN_PROOF_LEN: usize = 64;

/// A break-glass access request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyRequest {
    /// The locked-out super-admin.
    pub user_id: String,
    /// Why emergency access is needed.
    pub reason: String,
    /// Requested permission names. Every entry must be emergency-eligible.
    pub requested_permissions: Vec<String>,
    /// Proof of hardware-key possession (e.g. a prior assertion export).
    pub hardware_key_proof: String,
    /// How to reach the requester for follow-up.
    pub contact_info: String,
}

/// Grants reduced-permission sessions through the break-glass path.
pub struct EmergencyAccessHandler {
    sessions: Arc<SessionManager>,
    audit: Arc<AuditLog>,
}

impl EmergencyAccessHandler {
    /// Creates a handler granting sessions through `sessions`.
    #[must_use]
    pub fn new(sessions: Arc<SessionManager>, audit: Arc<AuditLog>) -> Self {
        Self { sessions, audit }
    }

    /// Validates a break-glass request and opens an emergency session.
    ///
    /// Checks run in a fixed order, first failure wins: reason length,
    /// permission eligibility, proof plausibility. A request naming any
    /// ineligible permission is rejected outright — never silently
    /// narrowed to the eligible subset.
    ///
    /// # Errors
    ///
    /// Currently infallible in practice; the `Result` mirrors the other
    /// session-producing operations.
    pub fn request_access(
        &self,
        request: EmergencyRequest,
        ip_address: &str,
        user_agent: &str,
    ) -> AdminResult<AuthOutcome> {
        self.request_access_at(request, ip_address, user_agent, Utc::now())
    }

    /// Break-glass request against an injected clock. Test seam.
    ///
    /// # Errors
    ///
    /// See [`Self::request_access`].
    pub fn request_access_at(
        &self,
        request: EmergencyRequest,
        ip_address: &str,
        user_agent: &str,
        now: DateTime<Utc>,
    ) -> AdminResult<AuthOutcome> {
        let reason_len = request.reason.chars().count();
        if reason_len < MIN_REASON_LEN || reason_len > MAX_REASON_LEN {
            return Ok(self.deny(
                &request,
                format!(
                    "Reason must be between {MIN_REASON_LEN} and {MAX_REASON_LEN} characters"
                ),
            ));
        }

        if request.requested_permissions.is_empty() {
            return Ok(self.deny(&request, "No permissions requested"));
        }
        let mut granted = Vec::new();
        for name in &request.requested_permissions {
            match AdminPermission::parse(name) {
                Some(permission) if permission.emergency_eligible() => {
                    if !granted.contains(&permission) {
                        granted.push(permission);
                    }
                }
                _ => {
                    return Ok(self.deny(
                        &request,
                        format!("Permission not eligible for emergency access: {name}"),
                    ));
                }
            }
        }

        if !proof_is_plausible(&request.hardware_key_proof) {
            return Ok(self.deny(&request, "Hardware key proof failed sanity check"));
        }

        let session = self.sessions.grant_emergency(
            &request.user_id,
            granted.clone(),
            ip_address,
            user_agent,
            now,
        );

        warn!(
            user_id = %request.user_id,
            session_id = %session.session_id,
            reason = %request.reason,
            contact = %request.contact_info,
            ip = ip_address,
            "EMERGENCY ACCESS GRANTED, bypassing hardware key verification"
        );
        self.audit.record(
            AuditAction::EmergencyAccess,
            &request.user_id,
            true,
            format!(
                "emergency session {} granted ({}) from {}; reason: {}; contact: {}",
                session.session_id,
                granted
                    .iter()
                    .map(AdminPermission::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
                ip_address,
                request.reason,
                request.contact_info
            ),
        );

        Ok(AuthOutcome {
            valid: true,
            session_id: Some(session.session_id),
            permissions: granted,
            reason: None,
            emergency_access: true,
        })
    }

    fn deny(&self, request: &EmergencyRequest, reason: impl Into<String>) -> AuthOutcome {
        let reason = reason.into();
        warn!(user_id = %request.user_id, %reason, "emergency access denied");
        self.audit.record(
            AuditAction::EmergencyAccess,
            &request.user_id,
            false,
            reason.clone(),
        );
        AuthOutcome::denied(reason)
    }
}

/// A plausible proof is long enough to be real key material and sticks to
/// the base64 alphabet. Deliberately weaker than assertion verification.
fn proof_is_plausible(proof: &str) -> bool {
    proof.len() >= MIN_PROOF_LEN
        && proof.bytes().all(|b| {
            b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'-' | b'_')
        })
}
