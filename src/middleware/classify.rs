//! DM classification.

use std::sync::Arc;

use tracing::warn;

use crate::config::CreatorCredentials;
use crate::content::JoinErrorKind;
use crate::framing::FramingError;
use crate::invite::{
    decrypt_invite_conversation_id, looks_like_invite_slug, parse_invite_slug,
    verify_invite_with_private_key, InviteError, ParsedInvite,
};
use crate::substrate::{Conversation, DmDelivery, MessagingAgent, SubstrateError};

/// What a DM delivery turned out to be.
#[derive(Clone)]
pub enum DmDisposition {
    /// Ordinary conversation; hand the delivery to the next layer.
    NotJoinRequest,
    /// Malformed or forged invite material; block the sender.
    BlockSender,
    /// A real invite that cannot be honored; tell the joiner why.
    SendError {
        kind: JoinErrorKind,
        invite_tag: String,
    },
    /// A verified invite from this identity; emit the invite event.
    Invite(Box<InviteAttempt>),
}

/// A verified join request, ready for handler dispatch.
#[derive(Clone)]
pub struct InviteAttempt {
    pub joiner_inbox_id: String,
    /// The decrypted conversation id, lowercase canonical form for UUIDs.
    pub conversation_id: String,
    pub invite: ParsedInvite,
    /// The conversation the joiner asked to be admitted into.
    pub target: Arc<dyn Conversation>,
}

/// Classify one DM delivery.
///
/// The decision procedure, in order:
/// 1. no text content → not a join request
/// 2. sender is this identity → not a join request
/// 3. unparseable text → block if it still has slug shape, else pass
/// 4. payload claims another creator → block
/// 5. signature does not recover to this key → block
/// 6. invite or conversation expired → send `ConversationExpired`
/// 7. token fails to decrypt → block
/// 8. substrate knows no such conversation → send `ConversationExpired`
///
/// A delivery that is both invite-expired and conversation-expired yields
/// exactly one error.
///
/// # Errors
/// Only substrate failures at the step-8 lookup propagate; every
/// cryptographic or format failure is folded into the disposition.
pub async fn classify_dm(
    delivery: &DmDelivery,
    credentials: &CreatorCredentials,
    agent: &dyn MessagingAgent,
) -> Result<DmDisposition, SubstrateError> {
    let Some(text) = delivery.content.extract_text() else {
        return Ok(DmDisposition::NotJoinRequest);
    };

    if delivery.sender_inbox_id == credentials.inbox_id() {
        return Ok(DmDisposition::NotJoinRequest);
    }

    let parsed = match parse_invite_slug(text) {
        Ok(parsed) => parsed,
        Err(error) => {
            if matches!(error, InviteError::Framing(FramingError::DecompressionBomb)) {
                warn!(sender = %delivery.sender_inbox_id, "rejected oversized invite payload");
            }
            return Ok(if looks_like_invite_slug(text) {
                DmDisposition::BlockSender
            } else {
                DmDisposition::NotJoinRequest
            });
        }
    };

    if parsed.creator_inbox_id() != credentials.inbox_id() {
        return Ok(DmDisposition::BlockSender);
    }

    if !verify_invite_with_private_key(parsed.signed(), credentials.secret()) {
        return Ok(DmDisposition::BlockSender);
    }

    if parsed.is_expired() || parsed.is_conversation_expired() {
        return Ok(DmDisposition::SendError {
            kind: JoinErrorKind::ConversationExpired,
            invite_tag: parsed.tag().to_string(),
        });
    }

    let conversation_id = match decrypt_invite_conversation_id(&parsed, credentials.secret()) {
        Ok(id) => id.to_string(),
        Err(_) => return Ok(DmDisposition::BlockSender),
    };

    match agent.conversation_by_id(&conversation_id).await? {
        Some(target) => Ok(DmDisposition::Invite(Box::new(InviteAttempt {
            joiner_inbox_id: delivery.sender_inbox_id.clone(),
            conversation_id,
            invite: parsed,
            target,
        }))),
        None => Ok(DmDisposition::SendError {
            kind: JoinErrorKind::ConversationExpired,
            invite_tag: parsed.tag().to_string(),
        }),
    }
}
