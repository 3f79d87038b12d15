//! Hardware key registry.
//!
//! Holds the enrolled public-key credentials super-admins authenticate
//! with. Credentials are sealed and persisted through the record store,
//! cached in memory, and looked up by an opaque registered ID.

use crate::audit::{AuditAction, AuditLog};
use crate::error::AdminResult;
use chrono::{DateTime, Utc};
use loadframe_crypto::{random_id, ED25519_PUBLIC_KEY_LEN};
use loadframe_keystore::RecordStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Keystore service name for credential records.
const KEY_SERVICE: &str = "loadframe-admin-keys";

/// Minimum plausible attestation payload length.
const MIN_ATTESTATION_LEN: usize = 16;

/// Leading byte of a packed attestation object (CBOR map header).
const ATTESTATION_MARKER: u8 = 0xA3;

/// Assertion algorithms this core can verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    /// Ed25519 (EdDSA over Curve25519).
    Ed25519,
}

impl KeyAlgorithm {
    /// Parses an algorithm name. Anything unverifiable does not parse.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ed25519" | "eddsa" => Some(Self::Ed25519),
            _ => None,
        }
    }
}

/// A credential as submitted for registration.
#[derive(Debug, Clone)]
pub struct NewKeyCredential {
    /// Caller-supplied key label.
    pub key_id: String,
    /// Raw public key bytes.
    pub public_key: Vec<u8>,
    /// Claimed algorithm name.
    pub algorithm: String,
}

/// A registered credential as stored and cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Opaque lookup key, generated at registration.
    pub registered_id: String,
    /// Owning super-admin.
    pub user_id: String,
    /// Caller-supplied key label.
    pub key_id: String,
    /// Raw public key bytes.
    pub public_key: Vec<u8>,
    /// Verified algorithm.
    pub algorithm: KeyAlgorithm,
    /// Anti-replay signature counter, advanced on each successful
    /// authentication.
    pub counter: u64,
    /// When the credential was enrolled.
    pub registered_at: DateTime<Utc>,
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationOutcome {
    /// Whether the credential was enrolled.
    pub registered: bool,
    /// The opaque lookup ID, present on success.
    pub registered_id: Option<String>,
    /// Denial reason, present on failure.
    pub reason: Option<String>,
}

impl RegistrationOutcome {
    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            registered: false,
            registered_id: None,
            reason: Some(reason.into()),
        }
    }
}

/// Owns the registered-credential table.
pub struct HardwareKeyRegistry {
    store: Arc<RecordStore>,
    audit: Arc<AuditLog>,
    keys: Mutex<HashMap<String, StoredCredential>>,
}

impl HardwareKeyRegistry {
    /// Creates a registry over `store`, auditing into `audit`.
    #[must_use]
    pub fn new(store: Arc<RecordStore>, audit: Arc<AuditLog>) -> Self {
        Self {
            store,
            audit,
            keys: Mutex::new(HashMap::new()),
        }
    }

    /// Enrolls a credential for `user_id`.
    ///
    /// Rejections (empty or mis-sized key, unknown algorithm, implausible
    /// attestation) come back in the outcome with a reason; every attempt
    /// is audited.
    ///
    /// # Errors
    ///
    /// Returns an error only when the credential cannot be persisted.
    pub fn register_key(
        &self,
        user_id: &str,
        credential: NewKeyCredential,
        attestation: Option<&[u8]>,
    ) -> AdminResult<RegistrationOutcome> {
        if credential.public_key.is_empty() {
            return Ok(self.reject_registration(user_id, "Public key must not be empty"));
        }

        let Some(algorithm) = KeyAlgorithm::parse(&credential.algorithm) else {
            return Ok(self.reject_registration(
                user_id,
                format!("Unsupported algorithm: {}", credential.algorithm),
            ));
        };

        if credential.public_key.len() != ED25519_PUBLIC_KEY_LEN {
            return Ok(self.reject_registration(
                user_id,
                format!(
                    "Public key must be {} bytes, got {}",
                    ED25519_PUBLIC_KEY_LEN,
                    credential.public_key.len()
                ),
            ));
        }

        if let Some(att) = attestation {
            if att.len() < MIN_ATTESTATION_LEN || att[0] != ATTESTATION_MARKER {
                return Ok(self.reject_registration(user_id, "Invalid attestation data"));
            }
        }

        let stored = StoredCredential {
            registered_id: random_id(),
            user_id: user_id.to_string(),
            key_id: credential.key_id,
            public_key: credential.public_key,
            algorithm,
            counter: 0,
            registered_at: Utc::now(),
        };

        let bytes = serde_json::to_vec(&stored)?;
        self.store.store(KEY_SERVICE, &stored.registered_id, &bytes)?;

        let registered_id = stored.registered_id.clone();
        self.keys_lock().insert(registered_id.clone(), stored);

        info!(user_id, %registered_id, "hardware key registered");
        self.audit.record(
            AuditAction::KeyRegister,
            user_id,
            true,
            format!("registered key {registered_id}"),
        );

        Ok(RegistrationOutcome {
            registered: true,
            registered_id: Some(registered_id),
            reason: None,
        })
    }

    /// Removes a credential. Returns whether one was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored record could not be deleted.
    pub fn revoke_key(&self, registered_id: &str) -> AdminResult<bool> {
        let removed = self.keys_lock().remove(registered_id);
        if removed.is_some() {
            self.store.delete(KEY_SERVICE, registered_id)?;
        }

        let user_id = removed
            .as_ref()
            .map(|c| c.user_id.clone())
            .unwrap_or_else(|| "unknown".to_string());
        info!(registered_id, revoked = removed.is_some(), "hardware key revocation");
        self.audit.record(
            AuditAction::KeyRevoke,
            user_id,
            removed.is_some(),
            format!("revoked key {registered_id}"),
        );

        Ok(removed.is_some())
    }

    /// Looks up a credential by registered ID, falling back to the record
    /// store for credentials enrolled before this process started.
    #[must_use]
    pub fn lookup(&self, registered_id: &str) -> Option<StoredCredential> {
        if let Some(credential) = self.keys_lock().get(registered_id) {
            return Some(credential.clone());
        }

        match self.store.load(KEY_SERVICE, registered_id) {
            Ok(Some(bytes)) => match serde_json::from_slice::<StoredCredential>(&bytes) {
                Ok(credential) => {
                    self.keys_lock()
                        .insert(registered_id.to_string(), credential.clone());
                    Some(credential)
                }
                Err(e) => {
                    warn!(registered_id, error = %e, "stored credential is unreadable");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!(registered_id, error = %e, "credential load failed");
                None
            }
        }
    }

    /// Advances the anti-replay counter after a successful authentication.
    /// Persistence is best-effort; the in-memory counter always moves.
    pub fn advance_counter(&self, registered_id: &str) {
        let mut keys = self.keys_lock();
        if let Some(credential) = keys.get_mut(registered_id) {
            credential.counter += 1;
            match serde_json::to_vec(credential) {
                Ok(bytes) => {
                    if let Err(e) = self.store.store(KEY_SERVICE, registered_id, &bytes) {
                        debug!(registered_id, error = %e, "counter persistence failed");
                    }
                }
                Err(e) => debug!(registered_id, error = %e, "counter serialization failed"),
            }
        }
    }

    /// Number of credentials currently known in memory.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.keys_lock().len()
    }

    /// Drops the in-memory credential cache. Stored records remain.
    pub fn clear_cache(&self) {
        self.keys_lock().clear();
    }

    fn reject_registration(&self, user_id: &str, reason: impl Into<String>) -> RegistrationOutcome {
        let reason = reason.into();
        warn!(user_id, %reason, "hardware key registration rejected");
        self.audit
            .record(AuditAction::KeyRegister, user_id, false, reason.clone());
        RegistrationOutcome::rejected(reason)
    }

    fn keys_lock(&self) -> MutexGuard<'_, HashMap<String, StoredCredential>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
