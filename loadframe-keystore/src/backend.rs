//! Backend abstraction over concrete secret stores.

use crate::error::KeystoreResult;

/// A store of opaque secret blobs keyed by (service, account).
///
/// Implementations hold already-sealed bytes; sealing happens above this
/// trait in [`crate::RecordStore`]. A missing entry is `Ok(None)`, never an
/// error.
pub trait SecretBackend: Send + Sync {
    /// Reads the blob stored under (service, account), if any.
    fn get(&self, service: &str, account: &str) -> KeystoreResult<Option<Vec<u8>>>;

    /// Writes (or overwrites) the blob under (service, account).
    fn set(&self, service: &str, account: &str, blob: &[u8]) -> KeystoreResult<()>;

    /// Removes the blob under (service, account). Missing entries are fine.
    fn delete(&self, service: &str, account: &str) -> KeystoreResult<()>;

    /// Short backend name for logging.
    fn name(&self) -> &'static str;
}
