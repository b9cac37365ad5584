//! Invite key-encryption-key derivation.
//!
//! The KEK is a pure function of the creator's signing key and inbox id, so
//! mint and consume recompute it independently and must agree. Rotating
//! nothing but the invite tag therefore leaves the KEK stable; all invites
//! under one creator key share it.

use hkdf::Hkdf;
use libsecp256k1::SecretKey;
use sha2::Sha256;

pub const INVITE_KEK_SALT: &[u8] = b"ConvosInviteV1";

/// Derive the 32-byte invite KEK for a creator identity.
///
/// `K = HKDF-SHA256(ikm = secret, salt = "ConvosInviteV1",
/// info = "inbox:" ‖ inbox_id, L = 32)`.
pub fn derive_invite_key(secret: &SecretKey, creator_inbox_id: &str) -> [u8; 32] {
    let ikm = secret.serialize();
    let mut info = Vec::with_capacity(6 + creator_inbox_id.len());
    info.extend_from_slice(b"inbox:");
    info.extend_from_slice(creator_inbox_id.as_bytes());

    let hk = Hkdf::<Sha256>::new(Some(INVITE_KEK_SALT), &ikm);
    let mut okm = [0u8; 32];
    hk.expand(&info, &mut okm)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    okm
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(fill: u8) -> SecretKey {
        SecretKey::parse(&[fill; 32]).unwrap()
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_invite_key(&key(1), "abc123");
        let b = derive_invite_key(&key(1), "abc123");
        assert_eq!(a, b);
    }

    #[test]
    fn derivation_separates_identities() {
        let base = derive_invite_key(&key(1), "abc123");
        assert_ne!(base, derive_invite_key(&key(1), "abc124"));
        assert_ne!(base, derive_invite_key(&key(2), "abc123"));
    }
}
