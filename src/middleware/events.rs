//! Invite event and handler trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::content::{JoinErrorContent, JoinErrorKind};
use crate::invite::ParsedInvite;
use crate::middleware::MiddlewareError;
use crate::substrate::Conversation;

/// A verified join request, handed to registered handlers.
///
/// `accept` and `reject` close over the conversations of the current
/// delivery; handlers receive an immutable view and may call either, both,
/// or neither, in any order. Neither call short-circuits later handlers.
pub struct InviteEvent {
    pub(crate) joiner_inbox_id: String,
    pub(crate) conversation_id: String,
    pub(crate) invite_tag: String,
    pub(crate) invite: ParsedInvite,
    pub(crate) target: Arc<dyn Conversation>,
    pub(crate) dm: Arc<dyn Conversation>,
}

impl InviteEvent {
    pub fn joiner_inbox_id(&self) -> &str {
        &self.joiner_inbox_id
    }

    /// The decrypted conversation id the joiner asked for.
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn invite_tag(&self) -> &str {
        &self.invite_tag
    }

    pub fn invite(&self) -> &ParsedInvite {
        &self.invite
    }

    /// Admit the joiner into the conversation.
    pub async fn accept(&self) -> Result<(), MiddlewareError> {
        self.target
            .add_members(std::slice::from_ref(&self.joiner_inbox_id))
            .await?;
        info!(
            joiner = %self.joiner_inbox_id,
            conversation = %self.conversation_id,
            "admitted joiner"
        );
        Ok(())
    }

    /// Send a structured rejection back on the DM.
    ///
    /// Defaults to [`JoinErrorKind::GenericFailure`] when no kind is given.
    pub async fn reject(&self, error: Option<JoinErrorKind>) -> Result<(), MiddlewareError> {
        let kind = error.unwrap_or(JoinErrorKind::GenericFailure);
        let content = JoinErrorContent::new(kind, self.invite_tag.clone());
        self.dm.send(content.encode()?).await?;
        Ok(())
    }
}

/// Trait for handling verified join requests.
///
/// Handlers run sequentially in registration order; a handler returning an
/// error is logged and answered with a `GenericFailure` rejection, and the
/// remaining handlers still run.
#[async_trait]
pub trait InviteEventHandler: Send + Sync {
    async fn on_invite(&self, event: &InviteEvent) -> Result<(), MiddlewareError>;
}
