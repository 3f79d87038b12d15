//! Append-only, capacity-bounded audit log.
//!
//! Every security decision in the admin components lands here before the
//! call returns. Entries are never edited or removed; the only attrition
//! is the capacity bound dropping the oldest entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default ceiling on retained entries.
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// The security operation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Hardware key registration.
    KeyRegister,
    /// Hardware key revocation.
    KeyRevoke,
    /// Hardware-key authentication attempt.
    Authenticate,
    /// Explicit session revocation.
    SessionRevoke,
    /// Break-glass emergency access request.
    EmergencyAccess,
}

/// One immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub action: AuditAction,
    /// The user the event concerns.
    pub user_id: String,
    /// Whether the operation was allowed.
    pub success: bool,
    /// Free-form detail. Never contains key material.
    pub context: String,
}

/// Shared audit sink. Cheap to append, bounded in memory.
pub struct AuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl AuditLog {
    /// Creates a log with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }

    /// Creates a log bounded at `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Appends an entry stamped with the current time.
    pub fn record(
        &self,
        action: AuditAction,
        user_id: impl Into<String>,
        success: bool,
        context: impl Into<String>,
    ) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            action,
            user_id: user_id.into(),
            success,
            context: context.into(),
        };
        let mut entries = self.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Returns up to `limit` entries, most recent first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        self.lock().iter().rev().take(limit).cloned().collect()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Counts failed entries newer than `cutoff`, scanning newest-first and
    /// stopping at the cutoff rather than walking the whole log.
    #[must_use]
    pub fn failures_since(&self, cutoff: DateTime<Utc>) -> usize {
        self.lock()
            .iter()
            .rev()
            .take_while(|e| e.timestamp >= cutoff)
            .filter(|e| !e.success)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<AuditEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
