//! Super-admin session management.
//!
//! Sessions are created by hardware-key authentication (or the emergency
//! handler), live in memory only, and die by TTL or revocation. There is
//! no renewal; an expired session means a fresh authentication.
//!
//! The session-count check and insert run inside one critical section so
//! concurrent authentications cannot both slip under the cap.

use crate::audit::{AuditAction, AuditLog};
use crate::error::AdminResult;
use crate::permissions::{AdminPermission, FULL_ADMIN};
use crate::registry::HardwareKeyRegistry;
use chrono::{DateTime, Duration, Utc};
use loadframe_crypto::{random_id, verify_assertion};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Fixed session lifetime in seconds (30 minutes).
pub const SESSION_TTL_SECS: i64 = 30 * 60;

/// Maximum concurrent non-emergency sessions per user.
pub const MAX_SESSIONS_PER_USER: usize = 2;

/// An authenticated privileged session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperAdminSession {
    /// Opaque unguessable session ID.
    pub session_id: String,
    /// The authenticated super-admin.
    pub user_id: String,
    /// Label of the key that opened the session, or `"emergency"`.
    pub key_id: String,
    /// Privileges this session carries.
    pub permissions: Vec<AdminPermission>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Lifetime in seconds.
    pub ttl_secs: i64,
    /// True for break-glass sessions.
    pub emergency_access: bool,
    /// Caller IP, for audit.
    pub ip_address: String,
    /// Caller user agent, for audit.
    pub user_agent: String,
}

impl SuperAdminSession {
    /// The instant this session stops being valid.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::seconds(self.ttl_secs)
    }

    /// Whether the session has expired as of `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// A hardware-key authentication attempt.
#[derive(Debug, Clone)]
pub struct AuthAttempt {
    /// Claimed super-admin.
    pub user_id: String,
    /// Registered ID of the key to authenticate against.
    pub registered_id: String,
    /// Assertion signature over `challenge ‖ client_data`.
    pub signature: Vec<u8>,
    /// The challenge the caller was asked to sign.
    pub challenge: Vec<u8>,
    /// Authenticator client data bound into the signature.
    pub client_data: Vec<u8>,
    /// Caller IP.
    pub ip_address: String,
    /// Caller user agent.
    pub user_agent: String,
}

/// Outcome of an authentication or emergency-access attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    /// Whether a session was created.
    pub valid: bool,
    /// The new session ID, present on success.
    pub session_id: Option<String>,
    /// Permissions the session carries.
    pub permissions: Vec<AdminPermission>,
    /// Denial reason, present on failure.
    pub reason: Option<String>,
    /// Whether this is a break-glass session.
    pub emergency_access: bool,
}

impl AuthOutcome {
    pub(crate) fn denied(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            session_id: None,
            permissions: Vec::new(),
            reason: Some(reason.into()),
            emergency_access: false,
        }
    }
}

/// Outcome of a session validity check.
#[derive(Debug, Clone, Serialize)]
pub struct SessionCheck {
    /// Whether the session is live.
    pub valid: bool,
    /// The session's permissions, present when valid.
    pub permissions: Option<Vec<AdminPermission>>,
    /// Denial reason, present when invalid.
    pub reason: Option<String>,
}

impl SessionCheck {
    fn denied(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            permissions: None,
            reason: Some(reason.into()),
        }
    }
}

/// Owns the in-memory session table and its invariants.
pub struct SessionManager {
    registry: Arc<HardwareKeyRegistry>,
    audit: Arc<AuditLog>,
    sessions: Mutex<HashMap<String, SuperAdminSession>>,
}

impl SessionManager {
    /// Creates a session manager authenticating against `registry`.
    #[must_use]
    pub fn new(registry: Arc<HardwareKeyRegistry>, audit: Arc<AuditLog>) -> Self {
        Self {
            registry,
            audit,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Authenticates a hardware-key assertion and opens a session.
    ///
    /// Denials (unknown key, bad signature, cap reached) come back in the
    /// outcome with a reason; every attempt is audited.
    ///
    /// # Errors
    ///
    /// Currently infallible in practice; the `Result` carries storage
    /// errors from counter persistence in future revisions.
    pub fn authenticate(&self, attempt: AuthAttempt) -> AdminResult<AuthOutcome> {
        self.authenticate_at(attempt, Utc::now())
    }

    /// Authenticates against an injected clock. Test seam.
    ///
    /// # Errors
    ///
    /// See [`Self::authenticate`].
    pub fn authenticate_at(
        &self,
        attempt: AuthAttempt,
        now: DateTime<Utc>,
    ) -> AdminResult<AuthOutcome> {
        let Some(credential) = self.registry.lookup(&attempt.registered_id) else {
            return Ok(self.deny_auth(&attempt.user_id, "Key not registered"));
        };

        let mut message =
            Vec::with_capacity(attempt.challenge.len() + attempt.client_data.len());
        message.extend_from_slice(&attempt.challenge);
        message.extend_from_slice(&attempt.client_data);

        let signature_ok =
            match verify_assertion(&credential.public_key, &message, &attempt.signature) {
                Ok(ok) => ok,
                Err(e) => {
                    // Malformed input is a denial, not an error.
                    debug!(error = %e, "assertion verification rejected malformed input");
                    false
                }
            };
        if !signature_ok {
            return Ok(self.deny_auth(&attempt.user_id, "Invalid signature"));
        }

        // Critical section: evict the dead, count the living, insert.
        // Splitting the count from the insert would let two concurrent
        // authentications both observe one free slot.
        let session = {
            let mut sessions = self.sessions_lock();
            sessions.retain(|_, s| !s.is_expired_at(now));

            let live = sessions
                .values()
                .filter(|s| s.user_id == attempt.user_id && !s.emergency_access)
                .count();
            if live >= MAX_SESSIONS_PER_USER {
                drop(sessions);
                return Ok(self.deny_auth(&attempt.user_id, "Maximum concurrent sessions exceeded"));
            }

            let session = SuperAdminSession {
                session_id: random_id(),
                user_id: attempt.user_id.clone(),
                key_id: credential.key_id.clone(),
                permissions: FULL_ADMIN.to_vec(),
                created_at: now,
                ttl_secs: SESSION_TTL_SECS,
                emergency_access: false,
                ip_address: attempt.ip_address.clone(),
                user_agent: attempt.user_agent.clone(),
            };
            sessions.insert(session.session_id.clone(), session.clone());
            session
        };

        self.registry.advance_counter(&attempt.registered_id);

        info!(
            user_id = %attempt.user_id,
            session_id = %session.session_id,
            ip = %attempt.ip_address,
            "super-admin session opened"
        );
        self.audit.record(
            AuditAction::Authenticate,
            &attempt.user_id,
            true,
            format!("session {} opened from {}", session.session_id, attempt.ip_address),
        );

        Ok(AuthOutcome {
            valid: true,
            session_id: Some(session.session_id),
            permissions: session.permissions,
            reason: None,
            emergency_access: false,
        })
    }

    /// Checks a session's validity, evicting it if expired.
    #[must_use]
    pub fn validate_session(&self, session_id: &str) -> SessionCheck {
        self.validate_session_at(session_id, Utc::now())
    }

    /// Validity check against an injected clock. Test seam.
    #[must_use]
    pub fn validate_session_at(&self, session_id: &str, now: DateTime<Utc>) -> SessionCheck {
        let mut sessions = self.sessions_lock();
        match sessions.get(session_id) {
            None => SessionCheck::denied("Session not found"),
            Some(session) if session.is_expired_at(now) => {
                sessions.remove(session_id);
                SessionCheck::denied("Session expired")
            }
            Some(session) => SessionCheck {
                valid: true,
                permissions: Some(session.permissions.clone()),
                reason: None,
            },
        }
    }

    /// Revokes a session immediately, regardless of remaining TTL.
    /// Returns whether a session was present.
    pub fn revoke_session(&self, session_id: &str, reason: &str) -> bool {
        let removed = self.sessions_lock().remove(session_id);

        let user_id = removed
            .as_ref()
            .map(|s| s.user_id.clone())
            .unwrap_or_else(|| "unknown".to_string());
        warn!(session_id, user_id = %user_id, reason, "session revoked");
        self.audit.record(
            AuditAction::SessionRevoke,
            user_id,
            removed.is_some(),
            format!("session {session_id} revoked: {reason}"),
        );

        removed.is_some()
    }

    /// Revokes every session belonging to `user_id`. Returns how many fell.
    pub fn revoke_all_for_user(&self, user_id: &str, reason: &str) -> usize {
        let revoked: Vec<String> = {
            let mut sessions = self.sessions_lock();
            let ids: Vec<String> = sessions
                .values()
                .filter(|s| s.user_id == user_id)
                .map(|s| s.session_id.clone())
                .collect();
            for id in &ids {
                sessions.remove(id);
            }
            ids
        };

        for session_id in &revoked {
            self.audit.record(
                AuditAction::SessionRevoke,
                user_id,
                true,
                format!("session {session_id} revoked: {reason}"),
            );
        }
        revoked.len()
    }

    /// Number of live sessions as of `now` (expired ones are evicted).
    #[must_use]
    pub fn active_count_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions_lock();
        sessions.retain(|_, s| !s.is_expired_at(now));
        sessions.len()
    }

    /// Number of live emergency sessions as of `now`.
    #[must_use]
    pub fn emergency_count_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions_lock();
        sessions.retain(|_, s| !s.is_expired_at(now));
        sessions.values().filter(|s| s.emergency_access).count()
    }

    /// Drops every session. Used at shutdown.
    pub fn clear(&self) {
        self.sessions_lock().clear();
    }

    /// Opens a break-glass session. Emergency sessions are exempt from and
    /// invisible to the non-emergency cap; the emergency handler has
    /// already validated the request.
    pub(crate) fn grant_emergency(
        &self,
        user_id: &str,
        permissions: Vec<AdminPermission>,
        ip_address: &str,
        user_agent: &str,
        now: DateTime<Utc>,
    ) -> SuperAdminSession {
        let session = SuperAdminSession {
            session_id: random_id(),
            user_id: user_id.to_string(),
            key_id: "emergency".to_string(),
            permissions,
            created_at: now,
            ttl_secs: SESSION_TTL_SECS,
            emergency_access: true,
            ip_address: ip_address.to_string(),
            user_agent: user_agent.to_string(),
        };
        self.sessions_lock()
            .insert(session.session_id.clone(), session.clone());
        session
    }

    fn deny_auth(&self, user_id: &str, reason: &str) -> AuthOutcome {
        warn!(user_id, reason, "authentication denied");
        self.audit
            .record(AuditAction::Authenticate, user_id, false, reason);
        AuthOutcome::denied(reason)
    }

    fn sessions_lock(&self) -> MutexGuard<'_, HashMap<String, SuperAdminSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
