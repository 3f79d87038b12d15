//! Secure record store for the LoadFrame trust core.
//!
//! Records are sealed (ChaCha20-Poly1305) before they reach any backend,
//! written to the OS keychain with an encrypted file mirror, and migrated
//! back into the keychain when only the file copy survives. Nothing is
//! persisted in plaintext, anywhere.
//!
//! # Backends
//!
//! - [`OsKeychain`] — the platform secret service via the `keyring` crate
//! - [`FileVault`] — one owner-only file per record under the app data dir
//!
//! [`RecordStore`] layers the two: keychain first, file vault as fallback
//! and mirror. Both backends failing a write is a hard error; license state
//! is never silently held in memory only.

mod backend;
mod error;
mod file_store;
mod os_store;
mod store;

pub use backend::SecretBackend;
pub use error::{KeystoreError, KeystoreResult};
pub use file_store::FileVault;
pub use os_store::OsKeychain;
pub use store::RecordStore;
