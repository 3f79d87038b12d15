//! License lifecycle: install, validate, remove, trial fallback.

use crate::device::DeviceFingerprint;
use crate::error::{LicenseError, LicenseResult};
use crate::record::{LicenseRecord, LicenseTier, TrialRecord, TRIAL_FEATURES};
use crate::token;
use chrono::{DateTime, Utc};
use loadframe_keystore::RecordStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Keystore service name for license state.
const SERVICE: &str = "loadframe-licensing";
/// Account holding the installed license record.
const LICENSE_ACCOUNT: &str = "license";
/// Account holding the trial record.
const TRIAL_ACCOUNT: &str = "trial";

/// Hot-path budget in milliseconds. Validations slower than this are
/// flagged in the log, never failed.
pub const SLOW_VALIDATION_MS: u128 = 100;

/// Outcome of a license or trial validation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Validation {
    /// Whether the caller currently holds a usable grant.
    pub is_valid: bool,
    /// Tier in effect. Always `Free` when invalid.
    pub tier: LicenseTier,
    /// Human-readable denial reason, absent on success.
    pub reason: Option<String>,
    /// When the grant runs out, if bounded.
    pub expires_at: Option<DateTime<Utc>>,
    /// Days until expiry: ceiling for licenses, whole days for trials.
    /// Absent for perpetual licenses.
    pub days_remaining: Option<i64>,
    /// Feature identifiers unlocked by the grant.
    pub features: Vec<String>,
}

impl Validation {
    fn denied(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            tier: LicenseTier::Free,
            reason: Some(reason.into()),
            expires_at: None,
            days_remaining: None,
            features: Vec::new(),
        }
    }
}

/// Owns the license/trial records and their validation policy.
///
/// Constructed once at startup and shared by reference. Records are cached
/// in memory after the initial load, keeping keystore I/O off the
/// validation hot path.
pub struct LicenseManager {
    store: Arc<RecordStore>,
    secret: Zeroizing<Vec<u8>>,
    binding: bool,
    fingerprint: String,
    license: Mutex<Option<LicenseRecord>>,
    trial: Mutex<Option<TrialRecord>>,
}

impl LicenseManager {
    /// Creates a manager over `store` using the embedded signing secret,
    /// loading any persisted license/trial state.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state exists but cannot be read.
    pub fn new(store: Arc<RecordStore>) -> LicenseResult<Self> {
        Self::with_secret(store, token::default_secret())
    }

    /// Creates a manager verifying against a caller-supplied secret.
    /// Used by tests with a generated secret.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state exists but cannot be read.
    pub fn with_secret(store: Arc<RecordStore>, secret: &[u8]) -> LicenseResult<Self> {
        let manager = Self {
            store,
            secret: Zeroizing::new(secret.to_vec()),
            binding: true,
            fingerprint: DeviceFingerprint::compute().id().to_string(),
            license: Mutex::new(None),
            trial: Mutex::new(None),
        };
        manager.load_state()?;
        Ok(manager)
    }

    /// Disables hardware binding. Install stops stamping fingerprints and
    /// validation stops checking them.
    #[must_use]
    pub fn binding_disabled(mut self) -> Self {
        self.binding = false;
        self
    }

    /// Overrides the machine fingerprint. Test seam for exercising binding
    /// mismatches without two machines.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    fn load_state(&self) -> LicenseResult<()> {
        if let Some(bytes) = self.store.load(SERVICE, LICENSE_ACCOUNT)? {
            let record: LicenseRecord = serde_json::from_slice(&bytes)?;
            *self.license_lock() = Some(record);
        }
        if let Some(bytes) = self.store.load(SERVICE, TRIAL_ACCOUNT)? {
            let trial: TrialRecord = serde_json::from_slice(&bytes)?;
            *self.trial_lock() = Some(trial);
        }
        Ok(())
    }

    /// Decodes, verifies, binds, and persists a license token.
    ///
    /// Installing replaces any previous license wholesale. Rejections
    /// (malformed token, bad signature) come back as an invalid
    /// [`Validation`] with a reason.
    ///
    /// # Errors
    ///
    /// Returns an error only when the record cannot be persisted.
    pub fn install_license(&self, token_str: &str) -> LicenseResult<Validation> {
        let mut record = match token::parse_with_secret(token_str, &self.secret) {
            Ok(record) => record,
            Err(LicenseError::InvalidFormat(detail)) => {
                warn!(%detail, "license install rejected: malformed token");
                return Ok(Validation::denied(format!("Invalid license format: {detail}")));
            }
            Err(LicenseError::InvalidSignature) => {
                warn!("license install rejected: signature mismatch");
                return Ok(Validation::denied("License signature is invalid"));
            }
            Err(e) => return Err(e),
        };

        if self.binding {
            record.hardware_fingerprint = Some(self.fingerprint.clone());
        }

        let bytes = serde_json::to_vec(&record)?;
        self.store.store(SERVICE, LICENSE_ACCOUNT, &bytes)?;
        info!(tier = %record.tier, user = %record.user_email, "license installed");
        *self.license_lock() = Some(record);

        self.validate()
    }

    /// Validates the installed license, falling back to the trial when no
    /// license is present.
    ///
    /// # Errors
    ///
    /// Returns an error only when trial state cannot be persisted.
    pub fn validate(&self) -> LicenseResult<Validation> {
        self.validate_at(Utc::now())
    }

    /// Validates against an injected clock. Test seam.
    ///
    /// # Errors
    ///
    /// Returns an error only when trial state cannot be persisted.
    pub fn validate_at(&self, now: DateTime<Utc>) -> LicenseResult<Validation> {
        let started = Instant::now();
        let result = self.validate_inner(now);
        let elapsed = started.elapsed().as_millis();
        if elapsed > SLOW_VALIDATION_MS {
            warn!(elapsed_ms = elapsed, "license validation exceeded hot-path budget");
        }
        result
    }

    fn validate_inner(&self, now: DateTime<Utc>) -> LicenseResult<Validation> {
        let guard = self.license_lock();
        let Some(record) = guard.as_ref() else {
            drop(guard);
            return self.validate_trial(now);
        };

        // Fixed check order: signature, binding, expiry. First failure wins.
        if !record.verify_signature(&self.secret) {
            return Ok(Validation::denied("License signature is invalid"));
        }

        if self.binding {
            if let Some(bound) = &record.hardware_fingerprint {
                if *bound != self.fingerprint {
                    return Ok(Validation::denied(
                        "License is bound to different hardware",
                    ));
                }
            }
        }

        if let Some(expires_at) = record.expires_at {
            if expires_at <= now {
                return Ok(Validation::denied(format!(
                    "License expired on {}",
                    expires_at.format("%Y-%m-%d")
                )));
            }
        }

        let days_remaining = record.expires_at.map(|expires_at| {
            let secs = (expires_at - now).num_seconds();
            (secs + 86_399) / 86_400
        });

        Ok(Validation {
            is_valid: true,
            tier: record.tier,
            reason: None,
            expires_at: record.expires_at,
            days_remaining,
            features: record.features.clone(),
        })
    }

    fn validate_trial(&self, now: DateTime<Utc>) -> LicenseResult<Validation> {
        let mut guard = self.trial_lock();
        let trial = match guard.take() {
            Some(trial) => trial,
            None => {
                let trial = TrialRecord::starting_at(now, Some(self.fingerprint.clone()));
                self.persist_trial(&trial)?;
                info!(max_days = trial.max_days, "no license installed, starting trial");
                trial
            }
        };
        let validation = self.check_trial(&trial, now);
        *guard = Some(trial);
        Ok(validation)
    }

    fn check_trial(&self, trial: &TrialRecord, now: DateTime<Utc>) -> Validation {
        if self.binding {
            if let Some(bound) = &trial.hardware_fingerprint {
                if *bound != self.fingerprint {
                    return Validation::denied("Trial is bound to different hardware");
                }
            }
        }

        if trial.is_expired(now) {
            return Validation {
                days_remaining: Some(0),
                ..Validation::denied("Trial period has expired")
            };
        }

        Validation {
            is_valid: true,
            tier: LicenseTier::Free,
            reason: None,
            expires_at: Some(trial.ends_at()),
            days_remaining: Some(trial.days_remaining(now)),
            features: TRIAL_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Returns the tier currently in effect. Hard errors degrade to
    /// `Free` — feature gating fails closed.
    #[must_use]
    pub fn tier(&self) -> LicenseTier {
        match self.validate() {
            Ok(validation) => validation.tier,
            Err(e) => {
                warn!(error = %e, "tier lookup degraded to free");
                LicenseTier::Free
            }
        }
    }

    /// Removes the installed license from both backends and starts a fresh
    /// trial.
    ///
    /// # Errors
    ///
    /// Returns an error if stored state cannot be deleted or the fresh
    /// trial cannot be persisted.
    pub fn remove_license(&self) -> LicenseResult<()> {
        self.store.delete(SERVICE, LICENSE_ACCOUNT)?;
        *self.license_lock() = None;

        let trial = TrialRecord::starting_at(Utc::now(), Some(self.fingerprint.clone()));
        self.persist_trial(&trial)?;
        *self.trial_lock() = Some(trial);

        info!("license removed, trial reinitialized");
        Ok(())
    }

    /// The fingerprint validations are checked against.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn persist_trial(&self, trial: &TrialRecord) -> LicenseResult<()> {
        let bytes = serde_json::to_vec(trial)?;
        self.store.store(SERVICE, TRIAL_ACCOUNT, &bytes)?;
        Ok(())
    }

    fn license_lock(&self) -> MutexGuard<'_, Option<LicenseRecord>> {
        self.license.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn trial_lock(&self) -> MutexGuard<'_, Option<TrialRecord>> {
        self.trial.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LicenseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseManager")
            .field("binding", &self.binding)
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}
