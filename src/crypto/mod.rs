//! Cryptographic primitives for the invite pipeline.
//!
//! Everything in this module is deliberately stateless: signing, key
//! derivation, and authenticated encryption are free functions over byte
//! slices so the codec layers above can stay pure. Key handling policy
//! (where the creator key comes from, how it is stored) lives in
//! [`config`](crate::config), not here.

mod aead;
mod ecdsa;
mod encoding;
mod kdf;

pub use aead::{open, seal, NONCE_LENGTH, TAG_LENGTH};
pub use ecdsa::{
    normalize_public_key, public_key, recover, sign_recoverable, SIGNATURE_LENGTH,
    UNCOMPRESSED_PUBLIC_KEY_LENGTH,
};
pub use encoding::{base64url_decode, base64url_encode};
pub use kdf::{derive_invite_key, INVITE_KEK_SALT};

use subtle::ConstantTimeEq;

/// Errors from the primitive layer.
///
/// Callers above the codec layer never see these directly; the invite
/// verifier collapses all of them to a boolean and the middleware maps
/// decrypt failures to a block decision.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid signature length: expected 65, got {0}")]
    InvalidSignatureLength(usize),
    #[error("invalid public key length: {0}")]
    InvalidPublicKeyLength(usize),
    #[error("secp256k1 error: {0}")]
    Secp256k1(#[from] libsecp256k1::Error),
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("authentication tag mismatch")]
    BadAuthTag,
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Compare two byte strings without early exit.
///
/// Returns false on length mismatch, otherwise accumulates the XOR of every
/// byte pair before deciding.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_slice_equality() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
