//! Property-based tests for the crypto primitives.
//!
//! These verify the properties the trust core leans on:
//! - A keyed tag verifies against the payload and secret that produced it
//! - Any bit-flip in payload or tag fails verification
//! - Sealing is reversible with the right key and detects tampering

use loadframe_crypto::{open, seal, sign, verify, SealedBlob, StorageKey, MAC_SIZE};
use proptest::prelude::*;

fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..2000)
}

fn secret_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..64)
}

mod signing_properties {
    use super::*;

    proptest! {
        /// verify(K, P, sign(K, P)) holds for all payloads and secrets
        #[test]
        fn roundtrip_verifies(
            secret in secret_strategy(),
            payload in payload_strategy(),
        ) {
            let tag = sign(&secret, &payload);
            prop_assert!(verify(&secret, &payload, &tag));
        }

        /// Any single bit-flip in the payload breaks verification
        #[test]
        fn payload_bitflip_fails(
            secret in secret_strategy(),
            payload in payload_strategy(),
            byte_pos in any::<usize>(),
            bit in 0u8..8,
        ) {
            let tag = sign(&secret, &payload);
            let mut tampered = payload.clone();
            let pos = byte_pos % tampered.len();
            tampered[pos] ^= 1 << bit;
            prop_assert!(!verify(&secret, &tampered, &tag));
        }

        /// Any single bit-flip in the tag breaks verification
        #[test]
        fn tag_bitflip_fails(
            secret in secret_strategy(),
            payload in payload_strategy(),
            byte_pos in 0usize..MAC_SIZE,
            bit in 0u8..8,
        ) {
            let mut tag = sign(&secret, &payload);
            tag[byte_pos] ^= 1 << bit;
            prop_assert!(!verify(&secret, &payload, &tag));
        }

        /// A different secret never verifies the same payload
        #[test]
        fn different_secret_fails(
            secret_a in secret_strategy(),
            secret_b in secret_strategy(),
            payload in payload_strategy(),
        ) {
            prop_assume!(secret_a != secret_b);
            let tag = sign(&secret_a, &payload);
            prop_assert!(!verify(&secret_b, &payload, &tag));
        }
    }
}

mod sealing_properties {
    use super::*;

    proptest! {
        /// Sealing then opening with the same key returns the plaintext
        #[test]
        fn seal_open_roundtrip(plaintext in prop::collection::vec(any::<u8>(), 0..5000)) {
            let key = StorageKey::random();
            let blob = seal(&key, &plaintext).unwrap();
            let opened = open(&key, &blob).unwrap();
            prop_assert_eq!(opened, plaintext);
        }

        /// Tampered ciphertext never opens
        #[test]
        fn tampered_ciphertext_fails(
            plaintext in payload_strategy(),
            tamper_pos in any::<usize>(),
            tamper_bit in 0u8..8,
        ) {
            let key = StorageKey::random();
            let mut blob = seal(&key, &plaintext).unwrap();
            let pos = tamper_pos % blob.ciphertext.len();
            blob.ciphertext[pos] ^= 1 << tamper_bit;
            prop_assert!(open(&key, &blob).is_err());
        }

        /// The base64 transport form is lossless
        #[test]
        fn base64_roundtrip(plaintext in prop::collection::vec(any::<u8>(), 0..2000)) {
            let key = StorageKey::random();
            let blob = seal(&key, &plaintext).unwrap();
            let decoded = SealedBlob::from_base64(&blob.to_base64()).unwrap();
            prop_assert_eq!(open(&key, &decoded).unwrap(), plaintext);
        }
    }
}
