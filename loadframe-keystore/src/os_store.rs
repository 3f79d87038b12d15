//! OS keychain backend.
//!
//! Wraps the platform secret service (macOS Keychain, Windows Credential
//! Manager, Secret Service on Linux). Blobs are stored base64-encoded as
//! the entry password.

use crate::backend::SecretBackend;
use crate::error::{KeystoreError, KeystoreResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use keyring::Entry;

/// The platform secret service.
#[derive(Debug, Default)]
pub struct OsKeychain;

impl OsKeychain {
    /// Creates a keychain backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn entry(service: &str, account: &str) -> KeystoreResult<Entry> {
        Entry::new(service, account).map_err(|e| KeystoreError::Backend(e.to_string()))
    }
}

impl SecretBackend for OsKeychain {
    fn get(&self, service: &str, account: &str) -> KeystoreResult<Option<Vec<u8>>> {
        let entry = Self::entry(service, account)?;
        match entry.get_password() {
            Ok(encoded) => {
                let blob = STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| KeystoreError::Backend(format!("corrupt keychain entry: {e}")))?;
                Ok(Some(blob))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KeystoreError::Backend(e.to_string())),
        }
    }

    fn set(&self, service: &str, account: &str, blob: &[u8]) -> KeystoreResult<()> {
        let entry = Self::entry(service, account)?;
        entry
            .set_password(&STANDARD.encode(blob))
            .map_err(|e| KeystoreError::Backend(e.to_string()))
    }

    fn delete(&self, service: &str, account: &str) -> KeystoreResult<()> {
        let entry = Self::entry(service, account)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeystoreError::Backend(e.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "os-keychain"
    }
}
