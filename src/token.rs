//! Versioned AEAD conversation tokens.
//!
//! A token conceals the conversation id from everyone except the creator:
//! `0x01 ‖ nonce ‖ ChaCha20-Poly1305(K, nonce, aad, plaintext)` where `K`
//! is the invite KEK and the AAD is the UTF-8 creator inbox id. The inbox
//! id therefore participates twice — hashed into the key derivation and
//! bound as AAD — so a token minted for one identity never opens under
//! another.

use std::fmt;

use libsecp256k1::SecretKey;
use uuid::Uuid;

use crate::crypto::{self, CryptoError};

/// Current token format version.
pub const TOKEN_VERSION: u8 = 0x01;

const ID_KIND_UUID: u8 = 0x01;
const ID_KIND_TEXT: u8 = 0x02;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("unsupported token version: {0}")]
    UnsupportedVersion(u8),
    #[error("authentication tag mismatch")]
    BadAuthTag,
    #[error("malformed token plaintext")]
    MalformedPlaintext,
    #[error("conversation id too long: {0} bytes")]
    IdTooLong(usize),
    #[error(transparent)]
    Crypto(CryptoError),
}

/// A conversation identifier as carried inside a token.
///
/// UUIDs get a compact 16-byte packing and round-trip as lowercase
/// canonical hyphenated form regardless of input case; everything else is
/// carried as UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationId {
    Uuid(Uuid),
    Text(String),
}

impl ConversationId {
    /// Classify a raw id string: canonical hyphenated UUIDs (any case)
    /// pack as UUIDs, everything else as text.
    ///
    /// Only the 36-character hyphenated form counts; a bare 32-hex
    /// substrate id must survive as text, not get rewritten into UUID
    /// canonical form.
    pub fn parse(raw: &str) -> Self {
        if raw.len() == 36 {
            if let Ok(uuid) = Uuid::try_parse(raw) {
                return ConversationId::Uuid(uuid);
            }
        }
        ConversationId::Text(raw.to_string())
    }

    fn pack(&self) -> Result<Vec<u8>, TokenError> {
        match self {
            ConversationId::Uuid(uuid) => {
                let mut out = Vec::with_capacity(17);
                out.push(ID_KIND_UUID);
                out.extend_from_slice(uuid.as_bytes());
                Ok(out)
            }
            ConversationId::Text(text) => {
                let bytes = text.as_bytes();
                match bytes.len() {
                    1..=255 => {
                        let mut out = Vec::with_capacity(2 + bytes.len());
                        out.push(ID_KIND_TEXT);
                        out.push(bytes.len() as u8);
                        out.extend_from_slice(bytes);
                        Ok(out)
                    }
                    len if len <= u16::MAX as usize => {
                        let mut out = Vec::with_capacity(4 + len);
                        out.push(ID_KIND_TEXT);
                        out.push(0x00);
                        out.extend_from_slice(&(len as u16).to_be_bytes());
                        out.extend_from_slice(bytes);
                        Ok(out)
                    }
                    len => Err(TokenError::IdTooLong(len)),
                }
            }
        }
    }

    fn unpack(plaintext: &[u8]) -> Result<Self, TokenError> {
        let (&kind, rest) = plaintext
            .split_first()
            .ok_or(TokenError::MalformedPlaintext)?;
        match kind {
            ID_KIND_UUID => {
                let bytes: [u8; 16] = rest
                    .try_into()
                    .map_err(|_| TokenError::MalformedPlaintext)?;
                Ok(ConversationId::Uuid(Uuid::from_bytes(bytes)))
            }
            ID_KIND_TEXT => {
                let (&len_byte, rest) =
                    rest.split_first().ok_or(TokenError::MalformedPlaintext)?;
                let (expected, body) = if len_byte > 0 {
                    (len_byte as usize, rest)
                } else {
                    if rest.len() < 2 {
                        return Err(TokenError::MalformedPlaintext);
                    }
                    let len = u16::from_be_bytes([rest[0], rest[1]]) as usize;
                    (len, &rest[2..])
                };
                if body.len() != expected {
                    return Err(TokenError::MalformedPlaintext);
                }
                let text = String::from_utf8(body.to_vec())
                    .map_err(|_| TokenError::MalformedPlaintext)?;
                Ok(ConversationId::Text(text))
            }
            _ => Err(TokenError::MalformedPlaintext),
        }
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Uuid's Display is the lowercase canonical hyphenated form.
            ConversationId::Uuid(uuid) => write!(f, "{uuid}"),
            ConversationId::Text(text) => f.write_str(text),
        }
    }
}

/// Encrypt a conversation id into a versioned token for `creator_inbox_id`.
pub fn encrypt_conversation_id(
    id: &ConversationId,
    secret: &SecretKey,
    creator_inbox_id: &str,
) -> Result<Vec<u8>, TokenError> {
    let key = crypto::derive_invite_key(secret, creator_inbox_id);
    let plaintext = id.pack()?;
    let sealed = crypto::seal(&key, creator_inbox_id.as_bytes(), &plaintext)
        .map_err(TokenError::Crypto)?;

    let mut token = Vec::with_capacity(1 + sealed.len());
    token.push(TOKEN_VERSION);
    token.extend_from_slice(&sealed);
    Ok(token)
}

/// Decrypt a token minted by [`encrypt_conversation_id`].
///
/// # Errors
/// `UnsupportedVersion` when the leading byte is not `0x01`; every AEAD
/// failure — wrong key, wrong inbox id, tampering — surfaces as
/// [`TokenError::BadAuthTag`].
pub fn decrypt_conversation_token(
    token: &[u8],
    secret: &SecretKey,
    creator_inbox_id: &str,
) -> Result<ConversationId, TokenError> {
    let (&version, sealed) = token.split_first().ok_or(TokenError::MalformedPlaintext)?;
    if version != TOKEN_VERSION {
        return Err(TokenError::UnsupportedVersion(version));
    }

    let key = crypto::derive_invite_key(secret, creator_inbox_id);
    let plaintext = crypto::open(&key, creator_inbox_id.as_bytes(), sealed)
        .map_err(|_| TokenError::BadAuthTag)?;
    ConversationId::unpack(&plaintext)
}
