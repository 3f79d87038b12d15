//! Crypto primitives for the LoadFrame trust core.
//!
//! Everything security-relevant in the trust core routes through this crate:
//! - SHA-256 digests and HMAC-SHA256 keyed signing for license material
//! - Ed25519 assertion verification for hardware-key authentication
//! - ChaCha20-Poly1305 sealing for records at rest
//! - Argon2id storage-key derivation
//! - Unguessable opaque identifiers
//!
//! No caller performs raw cryptographic arithmetic itself, and every
//! verification path fails closed: malformed input is an error or `false`,
//! never a default "valid".

mod assertion;
mod digest;
mod error;
mod kdf;
mod sealed;

pub use assertion::{verify_assertion, ED25519_PUBLIC_KEY_LEN};
pub use digest::{random_id, sha256, sha256_hex, sign, verify, MAC_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{derive_storage_key, KdfParams, StorageKey, KEY_SIZE, SALT_SIZE};
pub use sealed::{open, seal, SealedBlob, NONCE_SIZE, TAG_SIZE};
