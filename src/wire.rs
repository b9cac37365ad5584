//! Protobuf wire messages for invites and conversation metadata.
//!
//! The message structs are written by hand with prost field attributes so
//! the wire schema lives next to the code that uses it. Encoding is
//! deterministic for these shapes: every field is a scalar, an `Option`, or
//! a `repeated` whose order the caller controls, and prost emits fields in
//! tag order. Optional strings are omitted entirely when `None`, never
//! encoded as empty.
//!
//! Writers in the wild serialize absent expiry timestamps as an explicit
//! zero; [`normalized_expiry`] folds that wire-level zero back to "unset"
//! so both generations of writer decode identically.

use prost::Message;

/// The signed portion of an invite.
///
/// `conversation_token` is the versioned AEAD ciphertext of the
/// conversation id; `creator_inbox_id` carries the raw bytes of the
/// hex-encoded creator identity and scopes the signature check.
#[derive(Clone, PartialEq, Message)]
pub struct InvitePayload {
    #[prost(bytes = "vec", tag = "1")]
    pub conversation_token: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub creator_inbox_id: Vec<u8>,
    /// Ten-character alphanumeric tag tying this invite to the current
    /// conversation metadata.
    #[prost(string, tag = "3")]
    pub tag: String,
    #[prost(string, optional, tag = "4")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub description: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub image_url: Option<String>,
    /// Conversation-level TTL, seconds since epoch.
    #[prost(sfixed64, optional, tag = "7")]
    pub conversation_expires_at_unix: Option<i64>,
    /// Invite-level TTL, seconds since epoch.
    #[prost(sfixed64, optional, tag = "8")]
    pub expires_at_unix: Option<i64>,
    /// Advisory single-use hint; carried on the wire, not enforced.
    #[prost(bool, tag = "9")]
    pub expires_after_use: bool,
}

/// An encoded [`InvitePayload`] plus its recoverable signature.
///
/// `payload` holds the exact encoded bytes that were hashed and signed;
/// re-encoding a decoded payload is not guaranteed to reproduce them, so
/// verifiers must hash these bytes as-is.
#[derive(Clone, PartialEq, Message)]
pub struct SignedInvite {
    #[prost(bytes = "vec", tag = "1")]
    pub payload: Vec<u8>,
    /// 65 bytes: compact `r ‖ s` with low-s, then a recovery byte in 0..=3.
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

/// Per-conversation metadata persisted in the group's opaque `app_data`.
#[derive(Clone, PartialEq, Message)]
pub struct ConversationCustomMetadata {
    /// Current invite tag; rotating it invalidates all outstanding invites.
    #[prost(string, tag = "1")]
    pub tag: String,
    #[prost(message, repeated, tag = "2")]
    pub profiles: Vec<ConversationProfile>,
    #[prost(sfixed64, optional, tag = "3")]
    pub expires_at_unix: Option<i64>,
    /// Opaque passthrough for clients that encrypt conversation images.
    #[prost(bytes = "vec", optional, tag = "4")]
    pub image_encryption_key: Option<Vec<u8>>,
}

/// A member's in-conversation profile, keyed by inbox id.
#[derive(Clone, PartialEq, Message)]
pub struct ConversationProfile {
    #[prost(bytes = "vec", tag = "1")]
    pub inbox_id: Vec<u8>,
    #[prost(string, optional, tag = "2")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub image: Option<String>,
}

/// Fold a wire-level zero timestamp back to "not set".
pub fn normalized_expiry(raw: Option<i64>) -> Option<i64> {
    match raw {
        Some(0) | None => None,
        some => some,
    }
}

impl SignedInvite {
    /// Decode the inner [`InvitePayload`] from the signed bytes.
    pub fn decode_payload(&self) -> Result<InvitePayload, prost::DecodeError> {
        InvitePayload::decode(self.payload.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_strings_are_omitted_when_unset() {
        let payload = InvitePayload {
            conversation_token: vec![1, 2, 3],
            creator_inbox_id: b"abc".to_vec(),
            tag: "tag0123456".to_string(),
            ..Default::default()
        };
        let with_name = InvitePayload {
            name: Some(String::new()),
            ..payload.clone()
        };
        // An explicitly-present empty string still costs bytes; None costs none.
        assert!(payload.encode_to_vec().len() < with_name.encode_to_vec().len());
    }

    #[test]
    fn payload_round_trips() {
        let payload = InvitePayload {
            conversation_token: vec![0x01; 40],
            creator_inbox_id: b"abc123".to_vec(),
            tag: "aBcDeFgH12".to_string(),
            name: Some("Test Group Chat".to_string()),
            description: None,
            image_url: Some("https://example.org/i.png".to_string()),
            conversation_expires_at_unix: Some(1_900_000_000),
            expires_at_unix: None,
            expires_after_use: true,
        };
        let decoded = InvitePayload::decode(payload.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn expires_after_use_defaults_false() {
        let decoded = InvitePayload::decode(&[] as &[u8]).unwrap();
        assert!(!decoded.expires_after_use);
    }

    #[test]
    fn wire_zero_expiry_reads_as_unset() {
        assert_eq!(normalized_expiry(Some(0)), None);
        assert_eq!(normalized_expiry(None), None);
        assert_eq!(normalized_expiry(Some(77)), Some(77));
    }

    #[test]
    fn metadata_round_trips_with_profiles() {
        let metadata = ConversationCustomMetadata {
            tag: "0123456789".to_string(),
            profiles: vec![ConversationProfile {
                inbox_id: b"aa11".to_vec(),
                name: Some("A".to_string()),
                image: None,
            }],
            expires_at_unix: None,
            image_encryption_key: Some(vec![9; 32]),
        };
        let decoded =
            ConversationCustomMetadata::decode(metadata.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, metadata);
    }
}
