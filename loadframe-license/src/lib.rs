//! Licensing and trial management for LoadFrame.
//!
//! This crate owns the license/trial lifecycle:
//! - License token parsing and keyed-hash signature verification
//! - Hardware fingerprinting for machine binding
//! - A time-boxed unauthenticated trial when no license is installed
//! - Tier and feature derivation for the rest of the application
//!
//! # Design principles
//!
//! - **Fail closed**: an unsigned, mis-signed, or mis-bound record never
//!   validates; hard storage errors degrade tier derivation to `Free`.
//! - **Offline**: validation never touches the network; the signing secret
//!   is embedded and tokens are produced by the issuance service.
//! - **Hot path**: validation runs on every feature-gate check, so records
//!   are cached in memory and slow validations are flagged, not failed.
//!
//! # Token format
//!
//! A token is `base64url(payload_json)` where the payload is the license
//! record carrying an HMAC-SHA256 signature over its canonical field
//! string. See [`LicenseRecord::signing_payload`].

mod device;
mod error;
mod manager;
mod record;
mod token;

pub use device::{DeviceFingerprint, DeviceInfo};
pub use error::{LicenseError, LicenseResult};
pub use manager::{LicenseManager, Validation, SLOW_VALIDATION_MS};
pub use record::{LicenseRecord, LicenseTier, TrialRecord, TRIAL_FEATURES, TRIAL_MAX_DAYS};
pub use token::{parse, parse_with_secret};
