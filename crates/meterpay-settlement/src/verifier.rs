//! Signature verification seam.
//!
//! Settlement only needs "does signature S over message M verify against
//! key P". Malformed keys or signatures are simply "no".

use ed25519_dalek::{Signature, VerifyingKey};
use meterpay_types::PubKey;

/// Verifies a signature over a message against a party's public key.
pub trait SignatureVerifier {
    fn verify(&self, message: &[u8], signature: &[u8], key: &PubKey) -> bool;
}

/// Strict ed25519 verification.
///
/// Uses `verify_strict`, which rejects small-order keys and malleable
/// signatures, so every replica reaches the same verdict.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, message: &[u8], signature: &[u8], key: &PubKey) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(key.as_bytes()) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        verifying_key.verify_strict(message, &signature).is_ok()
    }
}
