//! Signed-invite codec: build, parse, verify, decrypt.
//!
//! An invite travels as a *slug*: the chunked base64url encoding of an
//! optionally-compressed protobuf [`SignedInvite`]. Building hashes the
//! encoded payload with SHA-256 and signs the digest with the creator's
//! key; parsing inverts the framing and surfaces expiry against the wall
//! clock; verification recovers the signer from the signature alone and
//! compares it with the expected key in constant time.
//!
//! # Typical Flow
//!
//! ```text
//! Creator:
//!   create_invite_slug(id, tag, credentials, options) → slug
//!   invite_url(&slug, &config) → https://.../v2?i=<slug>
//!
//! Joiner:
//!   join_via_url(agent, url) → DM with the bare slug sent to the creator
//!
//! Creator's middleware (on the DM):
//!   parse_invite_slug(text) → ParsedInvite
//!   verify_invite_with_private_key(...) → bool
//!   decrypt_invite_conversation_id(...) → ConversationId
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use libsecp256k1::SecretKey;
use prost::Message;
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::{CreatorCredentials, InviteConfig};
use crate::crypto::{self, CryptoError};
use crate::framing::{
    chunk_for_transport, compress_if_smaller, decompress, strip_transport_chunks, FramingError,
};
use crate::substrate::{Conversation as _, MessagingAgent, SubstrateError};
use crate::token::{
    decrypt_conversation_token, encrypt_conversation_id, ConversationId, TokenError,
};
use crate::wire::{normalized_expiry, InvitePayload, SignedInvite};

/// A slug is at least this long; shorter candidates are never invites.
pub const MIN_SLUG_LENGTH: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error("invalid invite slug")]
    InvalidSlug,
    #[error(transparent)]
    Framing(#[from] FramingError),
    #[error("invite decode error: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("invite has expired")]
    Expired,
    #[error("conversation has expired")]
    ConversationExpired,
    #[error("cannot join an invite minted by this identity")]
    SelfInvite,
    #[error(transparent)]
    Substrate(#[from] SubstrateError),
}

/// Optional display fields and timestamps for a new invite.
#[derive(Debug, Clone, Default)]
pub struct InviteOptions {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Conversation-level TTL, seconds since epoch.
    pub conversation_expires_at_unix: Option<i64>,
    /// Invite-level TTL, seconds since epoch.
    pub expires_at_unix: Option<i64>,
    /// Advisory single-use hint carried on the wire.
    pub expires_after_use: bool,
}

/// Build a signed invite slug for a conversation.
///
/// The conversation id is concealed inside an AEAD token only the creator
/// can open; everything else in the payload is plaintext but covered by
/// the signature.
pub fn create_invite_slug(
    conversation_id: &str,
    tag: &str,
    credentials: &CreatorCredentials,
    options: &InviteOptions,
) -> Result<String, InviteError> {
    let id = ConversationId::parse(conversation_id);
    let token = encrypt_conversation_id(&id, credentials.secret(), credentials.inbox_id())?;

    let payload = InvitePayload {
        conversation_token: token,
        creator_inbox_id: credentials.inbox_id().as_bytes().to_vec(),
        tag: tag.to_string(),
        name: options.name.clone(),
        description: options.description.clone(),
        image_url: options.image_url.clone(),
        conversation_expires_at_unix: normalized_expiry(options.conversation_expires_at_unix),
        expires_at_unix: normalized_expiry(options.expires_at_unix),
        expires_after_use: options.expires_after_use,
    };
    let payload_bytes = payload.encode_to_vec();

    let digest: [u8; 32] = Sha256::digest(&payload_bytes).into();
    let signature = crypto::sign_recoverable(&digest, credentials.secret());

    let signed = SignedInvite {
        payload: payload_bytes,
        signature: signature.to_vec(),
    };
    let framed = compress_if_smaller(&signed.encode_to_vec())?;
    Ok(chunk_for_transport(&crypto::base64url_encode(&framed)))
}

/// A parsed invite, expiry already evaluated against the wall clock.
#[derive(Debug, Clone)]
pub struct ParsedInvite {
    slug: String,
    signed: SignedInvite,
    payload: InvitePayload,
    creator_inbox_id: String,
    is_expired: bool,
    is_conversation_expired: bool,
}

impl ParsedInvite {
    /// The canonical chunked slug form, suitable as a DM body.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn signed(&self) -> &SignedInvite {
        &self.signed
    }

    pub fn payload(&self) -> &InvitePayload {
        &self.payload
    }

    /// The creator identity claimed by the payload, as a hex string.
    pub fn creator_inbox_id(&self) -> &str {
        &self.creator_inbox_id
    }

    pub fn tag(&self) -> &str {
        &self.payload.tag
    }

    pub fn name(&self) -> Option<&str> {
        self.payload.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.payload.description.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.payload.image_url.as_deref()
    }

    pub fn expires_at_unix(&self) -> Option<i64> {
        normalized_expiry(self.payload.expires_at_unix)
    }

    pub fn conversation_expires_at_unix(&self) -> Option<i64> {
        normalized_expiry(self.payload.conversation_expires_at_unix)
    }

    pub fn expires_after_use(&self) -> bool {
        self.payload.expires_after_use
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired
    }

    pub fn is_conversation_expired(&self) -> bool {
        self.is_conversation_expired
    }
}

/// Parse an invite from a slug or any recognized URL shape.
///
/// Recognized, in order: an `i` query parameter, a legacy `code` query
/// parameter, an app-scheme path such as `convos://join/<code>`, the
/// trailing path segment of a URL, and finally the raw input as a bare
/// slug. Whitespace is trimmed and `*` chunk separators are stripped
/// before decoding.
pub fn parse_invite_slug(input: &str) -> Result<ParsedInvite, InviteError> {
    let candidate = extract_slug_candidate(input);
    let compact = strip_transport_chunks(candidate.trim());
    if compact.is_empty() {
        return Err(InviteError::InvalidSlug);
    }

    let framed = crypto::base64url_decode(&compact).map_err(|_| InviteError::InvalidSlug)?;
    let raw = decompress(&framed)?;
    let signed = SignedInvite::decode(raw.as_slice())?;
    let payload = signed.decode_payload()?;

    let creator_inbox_id = String::from_utf8(payload.creator_inbox_id.clone())
        .map_err(|_| InviteError::InvalidSlug)?;

    let now = unix_now();
    let is_expired = is_past(normalized_expiry(payload.expires_at_unix), now);
    let is_conversation_expired =
        is_past(normalized_expiry(payload.conversation_expires_at_unix), now);

    Ok(ParsedInvite {
        slug: chunk_for_transport(&compact),
        signed,
        payload,
        creator_inbox_id,
        is_expired,
        is_conversation_expired,
    })
}

/// Whether a string that failed to parse still has the shape of a slug.
///
/// Used by the middleware to tell a malformed invite (block the sender)
/// from ordinary conversation (pass through).
pub fn looks_like_invite_slug(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() >= MIN_SLUG_LENGTH
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '*'))
}

fn extract_slug_candidate(input: &str) -> String {
    let trimmed = input.trim();
    if let Ok(url) = Url::parse(trimmed) {
        for key in ["i", "code"] {
            if let Some((_, value)) = url.query_pairs().find(|(k, _)| k == key) {
                return value.into_owned();
            }
        }
        // Covers both convos://join/<code> and a trailing path segment.
        if let Some(last) = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            return last.to_string();
        }
    }
    trimmed.to_string()
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn is_past(expiry: Option<i64>, now: i64) -> bool {
    matches!(expiry, Some(at) if at < now)
}

/// Verify a signed invite against an expected public key.
///
/// Both the recovered and the expected key are normalized to the 65-byte
/// uncompressed form and compared in constant time. Every internal failure
/// is reported as `false`; the reason never leaves this function.
pub fn verify_invite(signed: &SignedInvite, expected_public_key: &[u8]) -> bool {
    verify_inner(signed, expected_public_key).unwrap_or(false)
}

/// Verify a signed invite against the key pair of `secret`.
pub fn verify_invite_with_private_key(signed: &SignedInvite, secret: &SecretKey) -> bool {
    verify_invite(signed, &crypto::public_key(secret))
}

fn verify_inner(signed: &SignedInvite, expected_public_key: &[u8]) -> Result<bool, CryptoError> {
    let digest: [u8; 32] = Sha256::digest(&signed.payload).into();
    let recovered = crypto::recover(&digest, &signed.signature)?;
    let expected = crypto::normalize_public_key(expected_public_key)?;
    Ok(crypto::constant_time_eq(&recovered.serialize(), &expected))
}

/// Recover the public key that signed an invite, for diagnostics.
pub fn recovered_public_key(
    signed: &SignedInvite,
) -> Result<[u8; crypto::UNCOMPRESSED_PUBLIC_KEY_LENGTH], CryptoError> {
    let digest: [u8; 32] = Sha256::digest(&signed.payload).into();
    Ok(crypto::recover(&digest, &signed.signature)?.serialize())
}

/// Decrypt the conversation id concealed in a parsed invite.
///
/// The AAD is the `creator_inbox_id` found in the payload itself — by the
/// time this is called the middleware has already checked that it names
/// the verifier.
pub fn decrypt_invite_conversation_id(
    invite: &ParsedInvite,
    secret: &SecretKey,
) -> Result<ConversationId, TokenError> {
    decrypt_conversation_token(
        &invite.payload.conversation_token,
        secret,
        &invite.creator_inbox_id,
    )
}

/// Render the shareable URL for a slug.
pub fn invite_url(slug: &str, config: &InviteConfig) -> String {
    // The slug alphabet is URL-safe as-is; the base is used verbatim.
    format!("{}?i={}", config.invite_base_url(), slug)
}

/// What a joiner learns from an invite it sent back.
///
/// The conversation id stays concealed: only the creator can open the
/// token, so nothing here identifies the conversation.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub creator_inbox_id: String,
    pub invite_tag: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request to join via an invite URL: parse, validate, DM the slug back
/// to the creator.
pub async fn join_via_url(
    agent: &dyn MessagingAgent,
    invite_url: &str,
) -> Result<JoinRequest, InviteError> {
    let parsed = parse_invite_slug(invite_url)?;
    if parsed.is_expired() {
        return Err(InviteError::Expired);
    }
    if parsed.is_conversation_expired() {
        return Err(InviteError::ConversationExpired);
    }
    if parsed.creator_inbox_id() == agent.inbox_id() {
        return Err(InviteError::SelfInvite);
    }

    let dm = agent.create_dm(parsed.creator_inbox_id()).await?;
    dm.send_text(parsed.slug()).await?;

    tracing::info!(
        creator = parsed.creator_inbox_id(),
        slug_len = parsed.slug().len(),
        "sent join request"
    );

    Ok(JoinRequest {
        creator_inbox_id: parsed.creator_inbox_id().to_string(),
        invite_tag: parsed.tag().to_string(),
        name: parsed.name().map(str::to_string),
        description: parsed.description().map(str::to_string),
    })
}
