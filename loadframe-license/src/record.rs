//! License and trial records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of the unauthenticated trial in days.
pub const TRIAL_MAX_DAYS: i64 = 14;

/// Features granted during the trial. Deliberately smaller than any paid
/// tier; there is no upgrade path from trial state alone.
pub const TRIAL_FEATURES: &[&str] = &[
    "beam_analysis",
    "frame_3d_preview",
    "pdf_export_watermarked",
];

/// The product tier a license grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseTier {
    /// No paid entitlements.
    Free,
    /// Individual engineer license.
    Pro,
    /// Site license with collaboration features.
    Enterprise,
}

impl LicenseTier {
    /// Returns the fixed feature set for this tier.
    #[must_use]
    pub fn features(&self) -> &'static [&'static str] {
        match self {
            Self::Free => &[
                "beam_analysis",
                "project_storage",
                "pdf_export_watermarked",
            ],
            Self::Pro => &[
                "beam_analysis",
                "project_storage",
                "frame_3d",
                "load_combinations",
                "pdf_export",
                "dxf_import",
            ],
            Self::Enterprise => &[
                "beam_analysis",
                "project_storage",
                "frame_3d",
                "load_combinations",
                "pdf_export",
                "dxf_import",
                "multi_user_projects",
                "custom_sections",
                "api_access",
            ],
        }
    }
}

impl std::fmt::Display for LicenseTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        };
        write!(f, "{name}")
    }
}

/// An issued license, as decoded from a token and persisted locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// The raw token this record was decoded from. Not part of the signed
    /// surface (it is the carrier).
    #[serde(default)]
    pub license_key: String,
    /// Licensee email.
    pub user_email: String,
    /// Licensee display name.
    pub user_name: String,
    /// Granted tier.
    pub tier: LicenseTier,
    /// Issuance timestamp.
    pub issued_at: DateTime<Utc>,
    /// Expiry timestamp, or `None` for a perpetual license.
    pub expires_at: Option<DateTime<Utc>>,
    /// Feature identifiers unlocked by this license.
    pub features: Vec<String>,
    /// Hex HMAC-SHA256 tag over [`Self::signing_payload`].
    pub signature: String,
    /// Fingerprint of the machine this record was installed on. Stamped at
    /// install time, so also outside the signed surface.
    #[serde(default)]
    pub hardware_fingerprint: Option<String>,
}

impl LicenseRecord {
    /// Canonical byte string covered by the record signature.
    ///
    /// Fields are joined with `|` and features are sorted, so any mutation
    /// of a signed field breaks the tag regardless of JSON field order.
    #[must_use]
    pub fn signing_payload(&self) -> String {
        let mut features = self.features.clone();
        features.sort();
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.user_email,
            self.user_name,
            self.tier,
            self.issued_at.to_rfc3339(),
            self.expires_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "perpetual".to_string()),
            features.join(",")
        )
    }

    /// Verifies the record signature against `secret`.
    ///
    /// A signature that is not valid hex fails verification outright.
    #[must_use]
    pub fn verify_signature(&self, secret: &[u8]) -> bool {
        match hex::decode(&self.signature) {
            Ok(tag) => loadframe_crypto::verify(secret, self.signing_payload().as_bytes(), &tag),
            Err(_) => false,
        }
    }
}

/// The fallback grant used when no license is installed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRecord {
    /// When the trial began on this machine.
    pub start_date: DateTime<Utc>,
    /// Trial length in days.
    pub max_days: i64,
    /// Fingerprint of the machine the trial started on.
    #[serde(default)]
    pub hardware_fingerprint: Option<String>,
}

impl TrialRecord {
    /// Starts a fresh trial at `now`.
    #[must_use]
    pub fn starting_at(now: DateTime<Utc>, hardware_fingerprint: Option<String>) -> Self {
        Self {
            start_date: now,
            max_days: TRIAL_MAX_DAYS,
            hardware_fingerprint,
        }
    }

    /// Whole days elapsed since the trial started, clamped to
    /// `[0, max_days]`. Recomputed from the wall clock on every check.
    #[must_use]
    pub fn days_used(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_date).num_days().clamp(0, self.max_days)
    }

    /// Days left before the trial ends.
    #[must_use]
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        self.max_days - self.days_used(now)
    }

    /// Whether the trial window has been used up.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.days_used(now) >= self.max_days
    }

    /// The instant the trial window closes.
    #[must_use]
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.start_date + Duration::days(self.max_days)
    }
}
