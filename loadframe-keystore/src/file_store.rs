//! Encrypted-file fallback backend.
//!
//! One file per (service, account) under the app data directory. Files hold
//! sealed blobs only and are written temp-then-rename with owner-only
//! permissions, so a crash never leaves a partially written record.

use crate::backend::SecretBackend;
use crate::error::{KeystoreError, KeystoreResult};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Restricted-permission file storage for sealed records.
#[derive(Debug)]
pub struct FileVault {
    root: PathBuf,
}

impl FileVault {
    /// Opens the vault at the default app-data location.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform has no local data directory.
    pub fn new() -> KeystoreResult<Self> {
        let root = dirs::data_local_dir()
            .ok_or_else(|| KeystoreError::Backend("no local data directory".to_string()))?
            .join("LoadFrame")
            .join("vault");
        Ok(Self { root })
    }

    /// Opens the vault at an explicit root directory.
    #[must_use]
    pub fn at_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the vault's root directory.
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn entry_path(&self, service: &str, account: &str) -> PathBuf {
        self.root
            .join(format!("{}__{}.sealed", sanitize(service), sanitize(account)))
    }

    fn ensure_root(&self) -> KeystoreResult<()> {
        fs::create_dir_all(&self.root)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.root, fs::Permissions::from_mode(0o700))?;
        }
        Ok(())
    }
}

/// Maps a service/account name onto a safe file-name fragment.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

impl SecretBackend for FileVault {
    fn get(&self, service: &str, account: &str) -> KeystoreResult<Option<Vec<u8>>> {
        match fs::read(self.entry_path(service, account)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, service: &str, account: &str, blob: &[u8]) -> KeystoreResult<()> {
        self.ensure_root()?;
        let path = self.entry_path(service, account);
        let tmp = path.with_extension("sealed.tmp");

        fs::write(&tmp, blob)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, service: &str, account: &str) -> KeystoreResult<()> {
        match fs::remove_file(self.entry_path(service, account)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "file-vault"
    }
}
