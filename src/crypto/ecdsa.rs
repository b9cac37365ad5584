//! secp256k1 signing with public-key recovery.
//!
//! Signatures are the 65-byte compact form `r ‖ s ‖ v` with a low-s scalar
//! and a recovery byte in `{0..3}`, so verifiers can recover the signer's
//! public key from the digest alone.

use libsecp256k1::{Message, PublicKey, PublicKeyFormat, RecoveryId, SecretKey, Signature};

use crate::crypto::CryptoError;

pub const SIGNATURE_LENGTH: usize = 65;
pub const UNCOMPRESSED_PUBLIC_KEY_LENGTH: usize = 65;
const COMPRESSED_PUBLIC_KEY_LENGTH: usize = 33;

/// Sign a 32-byte digest, returning `r ‖ s ‖ v`.
///
/// The nonce is deterministic (RFC 6979) and `s` is already normalized to
/// the low half of the curve order, so signing the same digest twice with
/// the same key yields identical bytes.
pub fn sign_recoverable(digest: &[u8; 32], secret: &SecretKey) -> [u8; SIGNATURE_LENGTH] {
    let message = Message::parse(digest);
    let (signature, recovery_id) = libsecp256k1::sign(&message, secret);
    let mut out = [0u8; SIGNATURE_LENGTH];
    out[..64].copy_from_slice(&signature.serialize());
    out[64] = recovery_id.serialize();
    out
}

/// Recover the signing public key from a digest and a 65-byte signature.
///
/// # Errors
/// Rejects signatures whose length is not 65, whose recovery byte is
/// greater than 3, or whose scalars do not parse.
pub fn recover(digest: &[u8; 32], signature: &[u8]) -> Result<PublicKey, CryptoError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignatureLength(signature.len()));
    }
    let recovery_id = RecoveryId::parse(signature[64])?;
    let mut compact = [0u8; 64];
    compact.copy_from_slice(&signature[..64]);
    let mut parsed = Signature::parse_standard(&compact)?;
    parsed.normalize_s();
    let message = Message::parse(digest);
    Ok(libsecp256k1::recover(&message, &parsed, &recovery_id)?)
}

/// Derive the uncompressed (0x04-prefixed) public key for a secret key.
pub fn public_key(secret: &SecretKey) -> [u8; UNCOMPRESSED_PUBLIC_KEY_LENGTH] {
    PublicKey::from_secret_key(secret).serialize()
}

/// Normalize an encoded public key to the 65-byte uncompressed form.
///
/// Accepts 33-byte compressed and 65-byte uncompressed inputs; any other
/// length fails.
pub fn normalize_public_key(bytes: &[u8]) -> Result<[u8; UNCOMPRESSED_PUBLIC_KEY_LENGTH], CryptoError> {
    let key = match bytes.len() {
        UNCOMPRESSED_PUBLIC_KEY_LENGTH => {
            PublicKey::parse_slice(bytes, Some(PublicKeyFormat::Full))?
        }
        COMPRESSED_PUBLIC_KEY_LENGTH => {
            PublicKey::parse_slice(bytes, Some(PublicKeyFormat::Compressed))?
        }
        other => return Err(CryptoError::InvalidPublicKeyLength(other)),
    };
    Ok(key.serialize())
}
