//! The layered secure record store.

use crate::backend::SecretBackend;
use crate::error::{KeystoreError, KeystoreResult};
use crate::file_store::FileVault;
use crate::os_store::OsKeychain;
use loadframe_crypto::{open, seal, SealedBlob, StorageKey};
use tracing::{debug, warn};

/// Stores sealed records in the OS keychain with an encrypted file mirror.
///
/// Plaintext record bytes go in, sealed blobs come out the other side —
/// no backend ever sees unsealed data. Reads prefer the keychain; a record
/// found only in the file vault is migrated back into the keychain.
pub struct RecordStore {
    key: StorageKey,
    primary: Box<dyn SecretBackend>,
    fallback: Box<dyn SecretBackend>,
}

impl RecordStore {
    /// Creates a store over the default backends (OS keychain + file vault).
    ///
    /// # Errors
    ///
    /// Returns an error if the file vault location cannot be resolved.
    pub fn new(key: StorageKey) -> KeystoreResult<Self> {
        Ok(Self::with_backends(
            key,
            Box::new(OsKeychain::new()),
            Box::new(FileVault::new()?),
        ))
    }

    /// Creates a store over explicit backends.
    #[must_use]
    pub fn with_backends(
        key: StorageKey,
        primary: Box<dyn SecretBackend>,
        fallback: Box<dyn SecretBackend>,
    ) -> Self {
        Self {
            key,
            primary,
            fallback,
        }
    }

    /// Seals `plaintext` and writes it under (service, account).
    ///
    /// The sealed blob goes to the keychain and is mirrored to the file
    /// vault. One backend failing degrades with a warning; both failing is
    /// a hard error — record state is never held only in memory.
    ///
    /// # Errors
    ///
    /// Returns [`KeystoreError::Unavailable`] when neither backend took the
    /// write, or a crypto error if sealing itself failed.
    pub fn store(&self, service: &str, account: &str, plaintext: &[u8]) -> KeystoreResult<()> {
        let blob = seal(&self.key, plaintext)?;
        let encoded = blob.to_base64().into_bytes();

        let primary_result = self.primary.set(service, account, &encoded);
        let fallback_result = self.fallback.set(service, account, &encoded);

        match (primary_result, fallback_result) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(e)) => {
                warn!(service, account, backend = self.fallback.name(), error = %e,
                    "record mirror write failed");
                Ok(())
            }
            (Err(e), Ok(())) => {
                warn!(service, account, backend = self.primary.name(), error = %e,
                    "primary store write failed, record held by fallback only");
                Ok(())
            }
            (Err(p), Err(f)) => {
                warn!(service, account, primary_error = %p, fallback_error = %f,
                    "both secret backends rejected the write");
                Err(KeystoreError::Unavailable)
            }
        }
    }

    /// Loads and unseals the record under (service, account).
    ///
    /// Tries the keychain first; on a miss or failure falls back to the
    /// file vault and, on a file hit, migrates the blob back into the
    /// keychain. Absence is only trusted when the keychain answered — a
    /// broken keychain plus an empty file vault is an error, not `None`.
    ///
    /// # Errors
    ///
    /// Returns a crypto error for a tampered record, or a backend error
    /// when the record's presence cannot be determined.
    pub fn load(&self, service: &str, account: &str) -> KeystoreResult<Option<Vec<u8>>> {
        let primary_err = match self.primary.get(service, account) {
            Ok(Some(encoded)) => return self.unseal(&encoded).map(Some),
            Ok(None) => None,
            Err(e) => {
                debug!(service, account, backend = self.primary.name(), error = %e,
                    "primary store read failed, trying fallback");
                Some(e)
            }
        };

        match self.fallback.get(service, account) {
            Ok(Some(encoded)) => {
                if let Err(e) = self.primary.set(service, account, &encoded) {
                    debug!(service, account, error = %e,
                        "could not migrate record back into primary store");
                }
                self.unseal(&encoded).map(Some)
            }
            Ok(None) => match primary_err {
                None => Ok(None),
                Some(e) => Err(e),
            },
            Err(f) => {
                if primary_err.is_some() {
                    Err(KeystoreError::Unavailable)
                } else {
                    Err(f)
                }
            }
        }
    }

    /// Deletes the record from both backends. Missing entries are fine.
    ///
    /// # Errors
    ///
    /// Returns an error only when a backend failed while still holding the
    /// record.
    pub fn delete(&self, service: &str, account: &str) -> KeystoreResult<()> {
        let primary_result = self.primary.delete(service, account);
        let fallback_result = self.fallback.delete(service, account);
        primary_result?;
        fallback_result
    }

    fn unseal(&self, encoded: &[u8]) -> KeystoreResult<Vec<u8>> {
        let text = std::str::from_utf8(encoded)
            .map_err(|_| KeystoreError::Backend("stored blob is not base64 text".to_string()))?;
        let blob = SealedBlob::from_base64(text.trim())?;
        Ok(open(&self.key, &blob)?)
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.name())
            .finish_non_exhaustive()
    }
}
