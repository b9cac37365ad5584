//! Conversation metadata codec.
//!
//! A conversation's invite tag and member profiles live in the group's
//! opaque `app_data` string: protobuf-encoded, compressed when that wins,
//! then base64url. Rotating the tag invalidates every outstanding invite
//! for the conversation; profiles are an upsert set keyed by inbox id.

use prost::Message;
use rand::{distributions::Alphanumeric, Rng};

use crate::crypto::{base64url_decode, base64url_encode, CryptoError};
use crate::framing::{compress_if_smaller, decompress, FramingError};
use crate::wire::{ConversationCustomMetadata, ConversationProfile};

/// Invite tags are 10 alphanumeric characters.
pub const INVITE_TAG_LENGTH: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("invalid metadata encoding: {0}")]
    Encoding(#[from] CryptoError),
    #[error(transparent)]
    Framing(#[from] FramingError),
    #[error("metadata decode error: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Generate a fresh invite tag.
pub fn generate_invite_tag() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_TAG_LENGTH)
        .map(char::from)
        .collect()
}

/// Encode metadata for storage in `app_data`.
pub fn encode_metadata(metadata: &ConversationCustomMetadata) -> Result<String, MetadataError> {
    let bytes = metadata.encode_to_vec();
    let framed = compress_if_smaller(&bytes)?;
    Ok(base64url_encode(&framed))
}

/// Decode an `app_data` string produced by [`encode_metadata`].
pub fn decode_metadata(encoded: &str) -> Result<ConversationCustomMetadata, MetadataError> {
    let framed = base64url_decode(encoded.trim())?;
    let bytes = decompress(&framed)?;
    Ok(ConversationCustomMetadata::decode(bytes.as_slice())?)
}

/// Decode only the current invite tag.
pub fn invite_tag(encoded: &str) -> Result<String, MetadataError> {
    Ok(decode_metadata(encoded)?.tag)
}

impl ConversationCustomMetadata {
    /// Fresh metadata with a newly generated tag and no profiles.
    pub fn with_fresh_tag() -> Self {
        Self {
            tag: generate_invite_tag(),
            ..Default::default()
        }
    }

    /// Same metadata under a freshly generated tag.
    pub fn rotate_invite_tag(&self) -> Self {
        Self {
            tag: generate_invite_tag(),
            ..self.clone()
        }
    }

    /// Insert or replace the profile whose `inbox_id` matches byte-for-byte.
    pub fn upsert_profile(&mut self, profile: ConversationProfile) {
        match self
            .profiles
            .iter_mut()
            .find(|existing| existing.inbox_id == profile.inbox_id)
        {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    /// Look up a member's profile by inbox id.
    pub fn profile_for(&self, inbox_id: &[u8]) -> Option<&ConversationProfile> {
        self.profiles
            .iter()
            .find(|profile| profile.inbox_id == inbox_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_ten_alphanumeric_chars() {
        for _ in 0..32 {
            let tag = generate_invite_tag();
            assert_eq!(tag.len(), INVITE_TAG_LENGTH);
            assert!(tag.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn metadata_round_trips() {
        let mut metadata = ConversationCustomMetadata::with_fresh_tag();
        metadata.upsert_profile(ConversationProfile {
            inbox_id: b"aa".to_vec(),
            name: Some("A".to_string()),
            image: None,
        });
        let encoded = encode_metadata(&metadata).unwrap();
        assert_eq!(decode_metadata(&encoded).unwrap(), metadata);
        assert_eq!(invite_tag(&encoded).unwrap(), metadata.tag);
    }

    #[test]
    fn large_metadata_round_trips_compressed() {
        let mut metadata = ConversationCustomMetadata::with_fresh_tag();
        for i in 0..40u8 {
            metadata.upsert_profile(ConversationProfile {
                inbox_id: vec![i; 32],
                name: Some(format!("member number {i}")),
                image: Some("https://example.org/avatar.png".to_string()),
            });
        }
        let encoded = encode_metadata(&metadata).unwrap();
        assert_eq!(decode_metadata(&encoded).unwrap(), metadata);
    }

    #[test]
    fn rotate_keeps_profiles_and_changes_tag() {
        let mut metadata = ConversationCustomMetadata::with_fresh_tag();
        metadata.upsert_profile(ConversationProfile {
            inbox_id: b"aa".to_vec(),
            name: Some("A".to_string()),
            image: None,
        });
        let rotated = metadata.rotate_invite_tag();
        assert_ne!(rotated.tag, metadata.tag);
        assert_eq!(rotated.profiles, metadata.profiles);
    }

    #[test]
    fn upsert_replaces_by_inbox_id() {
        let mut metadata = ConversationCustomMetadata::with_fresh_tag();
        metadata.upsert_profile(ConversationProfile {
            inbox_id: b"aa".to_vec(),
            name: Some("A".to_string()),
            image: None,
        });
        metadata.upsert_profile(ConversationProfile {
            inbox_id: b"aa".to_vec(),
            name: Some("B".to_string()),
            image: Some("u".to_string()),
        });
        assert_eq!(metadata.profiles.len(), 1);
        assert_eq!(metadata.profiles[0].name.as_deref(), Some("B"));
        assert_eq!(metadata.profiles[0].image.as_deref(), Some("u"));
    }

    #[test]
    fn undecodable_app_data_errors() {
        assert!(decode_metadata("!!!not-base64!!!").is_err());
    }
}
