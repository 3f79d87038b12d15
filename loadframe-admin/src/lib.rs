//! Super-admin authentication, sessions, and audit for LoadFrame.
//!
//! This crate owns the privileged side of the trust core:
//! - [`HardwareKeyRegistry`] — enrolled public-key credentials
//! - [`SessionManager`] — capped, TTL-bounded super-admin sessions
//! - [`EmergencyAccessHandler`] — the break-glass path
//! - [`AuditLog`] — the shared append-only event sink
//!
//! [`SecurityCenter`] wires the four together at startup. Privileged
//! entry points in the application call
//! [`SessionManager::validate_session`] before doing anything.

mod audit;
mod emergency;
mod error;
mod permissions;
mod registry;
mod session;

pub use audit::{AuditAction, AuditEntry, AuditLog, DEFAULT_AUDIT_CAPACITY};
pub use emergency::{EmergencyAccessHandler, EmergencyRequest, MAX_REASON_LEN, MIN_REASON_LEN};
pub use error::{AdminError, AdminResult};
pub use permissions::{AdminPermission, EMERGENCY_ELIGIBLE, FULL_ADMIN};
pub use registry::{
    HardwareKeyRegistry, KeyAlgorithm, NewKeyCredential, RegistrationOutcome, StoredCredential,
};
pub use session::{
    AuthAttempt, AuthOutcome, SessionCheck, SessionManager, SuperAdminSession,
    MAX_SESSIONS_PER_USER, SESSION_TTL_SECS,
};

use chrono::{Duration, Utc};
use loadframe_keystore::RecordStore;
use std::sync::Arc;
use tracing::info;

/// Point-in-time security posture, derived from current in-memory state.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SecurityStats {
    /// Live sessions (emergency included).
    pub active_session_count: usize,
    /// Credentials known to the registry.
    pub registered_key_count: usize,
    /// Entries retained in the audit log.
    pub audit_log_size: usize,
    /// Failed operations in the trailing hour.
    pub recent_failed_attempts: usize,
    /// Live emergency sessions.
    pub emergency_access_count: usize,
}

/// Owns the admin security components for the lifetime of the process.
///
/// Constructed once at startup and shared by reference; there are no
/// global singletons to reach into.
pub struct SecurityCenter {
    audit: Arc<AuditLog>,
    registry: Arc<HardwareKeyRegistry>,
    sessions: Arc<SessionManager>,
    emergency: EmergencyAccessHandler,
}

impl SecurityCenter {
    /// Wires the registry, session manager, emergency handler, and audit
    /// log over `store`.
    #[must_use]
    pub fn new(store: Arc<RecordStore>) -> Self {
        let audit = Arc::new(AuditLog::new());
        let registry = Arc::new(HardwareKeyRegistry::new(store, Arc::clone(&audit)));
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&registry),
            Arc::clone(&audit),
        ));
        let emergency = EmergencyAccessHandler::new(Arc::clone(&sessions), Arc::clone(&audit));

        Self {
            audit,
            registry,
            sessions,
            emergency,
        }
    }

    /// The shared audit log.
    #[must_use]
    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// The hardware key registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<HardwareKeyRegistry> {
        &self.registry
    }

    /// The session manager.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// The emergency access handler.
    #[must_use]
    pub fn emergency(&self) -> &EmergencyAccessHandler {
        &self.emergency
    }

    /// Derives the current security posture. Scans only the live
    /// collections, never a historical log.
    #[must_use]
    pub fn statistics(&self) -> SecurityStats {
        let now = Utc::now();
        SecurityStats {
            active_session_count: self.sessions.active_count_at(now),
            registered_key_count: self.registry.registered_count(),
            audit_log_size: self.audit.len(),
            recent_failed_attempts: self.audit.failures_since(now - Duration::hours(1)),
            emergency_access_count: self.sessions.emergency_count_at(now),
        }
    }

    /// Clears in-memory sessions and cached credentials. Called at process
    /// shutdown; persisted credential records remain.
    pub fn shutdown(&self) {
        self.sessions.clear();
        self.registry.clear_cache();
        info!("security center shut down, in-memory state cleared");
    }
}
