//! ChaCha20-Poly1305 sealing with a prepended random nonce.

use chacha20poly1305::{
    aead::{Aead, KeyInit, OsRng, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;

use crate::crypto::CryptoError;

pub const NONCE_LENGTH: usize = 12;
pub const TAG_LENGTH: usize = 16;

/// Encrypt `plaintext` under `key`, binding `aad`.
///
/// Returns `nonce ‖ ciphertext ‖ tag`; the nonce is 12 random bytes and the
/// 16-byte Poly1305 tag is appended by the AEAD.
pub fn seal(key: &[u8; 32], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut out = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a `nonce ‖ ciphertext ‖ tag` frame produced by [`seal`].
///
/// Any tampering with the ciphertext, nonce, AAD, or key surfaces as
/// [`CryptoError::BadAuthTag`].
pub fn open(key: &[u8; 32], aad: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < NONCE_LENGTH + TAG_LENGTH {
        return Err(CryptoError::BadAuthTag);
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LENGTH);

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::BadAuthTag)
}
