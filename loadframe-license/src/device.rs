//! Device fingerprinting for license binding.
//!
//! Produces a stable hash identifying this machine, so licenses and trials
//! cannot be copied between machines. A component that cannot be read
//! degrades to a sentinel instead of failing — fingerprinting must never
//! block startup — but a degraded fingerprint is flagged so audit can tell
//! it apart from a fully resolved one.

use serde::{Deserialize, Serialize};
use std::env;

/// Sentinel used when a fingerprint component cannot be resolved.
const SENTINEL: &str = "unknown";

/// Delimiter joining fingerprint components before hashing.
const DELIMITER: &str = "|";

/// Information about the current device, for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Operating system name.
    pub os_name: String,
    /// Operating system version.
    pub os_version: String,
    /// Hostname.
    pub hostname: String,
    /// CPU architecture.
    pub arch: String,
}

impl DeviceInfo {
    /// Collects information about the current device.
    #[must_use]
    pub fn collect() -> Self {
        Self {
            os_name: env::consts::OS.to_string(),
            os_version: get_os_version(),
            hostname: get_hostname().unwrap_or_else(|| SENTINEL.to_string()),
            arch: env::consts::ARCH.to_string(),
        }
    }
}

/// A stable fingerprint identifying this machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFingerprint {
    /// SHA-256 over the joined component string, hex encoded.
    id: String,
    /// True when any component fell back to the sentinel.
    degraded: bool,
}

impl DeviceFingerprint {
    /// Computes the fingerprint for the current machine.
    ///
    /// Components: hostname, OS, architecture, machine ID, CPU model —
    /// joined with a fixed delimiter and hashed. Survives reboots; changes
    /// when the hardware identity changes.
    #[must_use]
    pub fn compute() -> Self {
        let mut degraded = false;
        let mut component = |value: Option<String>| {
            value.unwrap_or_else(|| {
                degraded = true;
                SENTINEL.to_string()
            })
        };

        let parts = [
            component(get_hostname()),
            env::consts::OS.to_string(),
            env::consts::ARCH.to_string(),
            component(get_machine_id()),
            component(get_cpu_model()),
        ];

        let id = loadframe_crypto::sha256_hex(parts.join(DELIMITER).as_bytes());
        Self { id, degraded }
    }

    /// Returns the fingerprint hash.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when any component could not be resolved.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Whether this fingerprint matches the current machine.
    #[must_use]
    pub fn matches_current(&self) -> bool {
        self.id == Self::compute().id
    }
}

/// Gets the machine hostname.
fn get_hostname() -> Option<String> {
    hostname::get().ok().and_then(|h| h.into_string().ok())
}

/// Gets the OS version string.
fn get_os_version() -> String {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| SENTINEL.to_string())
    }

    #[cfg(target_os = "windows")]
    {
        "windows".to_string()
    }

    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("VERSION_ID="))
                    .map(|l| {
                        l.trim_start_matches("VERSION_ID=")
                            .trim_matches('"')
                            .to_string()
                    })
            })
            .unwrap_or_else(|| SENTINEL.to_string())
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        SENTINEL.to_string()
    }
}

/// Gets the machine ID (platform-specific stable identifier).
fn get_machine_id() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("IOPlatformUUID"))
                    .and_then(|l| l.split('"').nth(3))
                    .map(String::from)
            })
    }

    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .map(|s| s.trim().to_string())
    }

    #[cfg(target_os = "windows")]
    {
        None
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

/// Gets the primary CPU model string.
fn get_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo").ok().and_then(|content| {
            content
                .lines()
                .find(|l| l.starts_with("model name"))
                .and_then(|l| l.split(':').nth(1))
                .map(|s| s.trim().to_string())
        })
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("sysctl")
            .args(["-n", "machdep.cpu.brand_string"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        None
    }
}
