//! Cross-entity binding tests for the invite pipeline.
//!
//! The creator inbox id appears twice in an invite: hashed into the KEK
//! and bound as AAD, and spelled out in the payload that the signature
//! covers. These tests pin down that the two uses cannot be split apart.

use prost::Message;
use sha2::{Digest, Sha256};

use convos_invite::config::{parse_private_key, CreatorCredentials};
use convos_invite::crypto::sign_recoverable;
use convos_invite::invite::{
    create_invite_slug, decrypt_invite_conversation_id, parse_invite_slug, recovered_public_key,
    verify_invite, verify_invite_with_private_key, InviteOptions,
};
use convos_invite::token::encrypt_conversation_id;
use convos_invite::token::ConversationId;
use convos_invite::wire::{InvitePayload, SignedInvite};

const CREATOR_KEY: &str = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20";
const INBOX_A: &str = "abcabcabcabcabcabcabcabcabcabcab";
const INBOX_B: &str = "defdefdefdefdefdefdefdefdefdefde";
const CONV_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

fn credentials(inbox: &str) -> CreatorCredentials {
    CreatorCredentials::new(inbox, parse_private_key(CREATOR_KEY).unwrap())
}

#[test]
fn full_pipeline_round_trip() {
    let secret = parse_private_key(CREATOR_KEY).unwrap();
    let creds = credentials(INBOX_A);
    let options = InviteOptions {
        name: Some("Test Group Chat".to_string()),
        description: Some("weekly sync".to_string()),
        expires_after_use: true,
        ..Default::default()
    };
    let slug = create_invite_slug(CONV_ID, "tAg0123456", &creds, &options).unwrap();
    let parsed = parse_invite_slug(&slug).unwrap();

    assert_eq!(parsed.tag(), "tAg0123456");
    assert_eq!(parsed.creator_inbox_id(), INBOX_A);
    assert_eq!(parsed.name(), Some("Test Group Chat"));
    assert_eq!(parsed.description(), Some("weekly sync"));
    assert!(parsed.expires_after_use());
    assert!(verify_invite_with_private_key(parsed.signed(), &secret));

    let id = decrypt_invite_conversation_id(&parsed, &secret).unwrap();
    assert_eq!(id.to_string(), CONV_ID);
}

#[test]
fn recovered_key_matches_creator() {
    let creds = credentials(INBOX_A);
    let slug =
        create_invite_slug(CONV_ID, "tAg0123456", &creds, &InviteOptions::default()).unwrap();
    let parsed = parse_invite_slug(&slug).unwrap();
    assert_eq!(
        recovered_public_key(parsed.signed()).unwrap(),
        creds.public_key()
    );
}

#[test]
fn swapped_inbox_id_cannot_both_verify_and_decrypt() {
    // Token sealed for inbox A, but the payload claims inbox B and the
    // signature honestly covers that claim.
    let secret = parse_private_key(CREATOR_KEY).unwrap();
    let token =
        encrypt_conversation_id(&ConversationId::parse(CONV_ID), &secret, INBOX_A).unwrap();

    let payload = InvitePayload {
        conversation_token: token,
        creator_inbox_id: INBOX_B.as_bytes().to_vec(),
        tag: "tAg0123456".to_string(),
        ..Default::default()
    };
    let payload_bytes = payload.encode_to_vec();
    let digest: [u8; 32] = Sha256::digest(&payload_bytes).into();
    let signed = SignedInvite {
        payload: payload_bytes,
        signature: sign_recoverable(&digest, &secret).to_vec(),
    };

    // The signature verifies (it really was made by this key)...
    assert!(verify_invite_with_private_key(&signed, &secret));

    // ...but decryption under the payload's inbox id must fail, because
    // the AAD and KEK were derived for a different identity.
    let encoded = convos_invite::crypto::base64url_encode(
        &convos_invite::framing::compress_if_smaller(&signed.encode_to_vec()).unwrap(),
    );
    let parsed = parse_invite_slug(&encoded).unwrap();
    assert!(decrypt_invite_conversation_id(&parsed, &secret).is_err());
}

#[test]
fn tampered_payload_bytes_fail_verification() {
    let creds = credentials(INBOX_A);
    let slug =
        create_invite_slug(CONV_ID, "tAg0123456", &creds, &InviteOptions::default()).unwrap();
    let parsed = parse_invite_slug(&slug).unwrap();

    for position in [0, 5, 20] {
        let mut tampered = parsed.signed().clone();
        tampered.payload[position] ^= 0x01;
        assert!(!verify_invite(&tampered, &creds.public_key()));
    }
}
