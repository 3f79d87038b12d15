//! Admin permission model.
//!
//! Two fixed sets: the five-permission full-admin set granted to
//! hardware-key sessions, and the two-permission subset an emergency
//! session may carry. Anything not in the enum does not parse and is
//! rejected by default.

use serde::{Deserialize, Serialize};

/// A privilege a super-admin session may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminPermission {
    /// Create, modify, and disable user accounts.
    UserManagement,
    /// Reset credentials for locked-out users.
    UserRecovery,
    /// Install, replace, and revoke licenses.
    LicenseManagement,
    /// Change system-wide configuration.
    SystemConfig,
    /// Lift emergency lockouts.
    EmergencyUnlock,
}

/// The full-admin set granted by hardware-key authentication.
pub const FULL_ADMIN: [AdminPermission; 5] = [
    AdminPermission::UserManagement,
    AdminPermission::UserRecovery,
    AdminPermission::LicenseManagement,
    AdminPermission::SystemConfig,
    AdminPermission::EmergencyUnlock,
];

/// Permissions an emergency session may request.
pub const EMERGENCY_ELIGIBLE: [AdminPermission; 2] =
    [AdminPermission::UserRecovery, AdminPermission::EmergencyUnlock];

impl AdminPermission {
    /// The wire name of this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserManagement => "user_management",
            Self::UserRecovery => "user_recovery",
            Self::LicenseManagement => "license_management",
            Self::SystemConfig => "system_config",
            Self::EmergencyUnlock => "emergency_unlock",
        }
    }

    /// Parses a permission by wire name. Unknown names do not parse.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "user_management" => Some(Self::UserManagement),
            "user_recovery" => Some(Self::UserRecovery),
            "license_management" => Some(Self::LicenseManagement),
            "system_config" => Some(Self::SystemConfig),
            "emergency_unlock" => Some(Self::EmergencyUnlock),
            _ => None,
        }
    }

    /// Whether this permission may be granted through the break-glass path.
    #[must_use]
    pub fn emergency_eligible(&self) -> bool {
        EMERGENCY_ELIGIBLE.contains(self)
    }
}

impl std::fmt::Display for AdminPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
