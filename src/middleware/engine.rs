//! Effectful middleware over classified deliveries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::config::{CreatorCredentials, InviteConfig};
use crate::content::{JoinErrorContent, JoinErrorKind};
use crate::middleware::classify::{classify_dm, DmDisposition, InviteAttempt};
use crate::middleware::events::{InviteEvent, InviteEventHandler};
use crate::middleware::MiddlewareError;
use crate::substrate::{Conversation as _, DmDelivery, MessagingAgent};

/// How a DM delivery was consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmOutcome {
    /// Not a join request; the next layer should see the delivery.
    PassThrough,
    /// The sender was blocked.
    Blocked,
    /// A structured error was sent back to the joiner.
    ErrorSent,
    /// Handlers ran for a verified invite.
    InviteHandled,
}

impl DmOutcome {
    /// Whether the middleware consumed the delivery.
    pub fn consumed(&self) -> bool {
        !matches!(self, DmOutcome::PassThrough)
    }
}

/// Identifies a registered handler for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// The join-request middleware for one creator identity.
///
/// Deliveries are processed sequentially with respect to a single delivery
/// source; the credentials are read-only after construction, so one
/// instance can be shared freely across tasks.
pub struct JoinRequestMiddleware {
    agent: Arc<dyn MessagingAgent>,
    credentials: CreatorCredentials,
    handlers: RwLock<Vec<(HandlerId, Arc<dyn InviteEventHandler>)>>,
    next_handler_id: AtomicU64,
}

impl JoinRequestMiddleware {
    /// Bind the middleware to a substrate agent and invite configuration.
    pub fn new(agent: Arc<dyn MessagingAgent>, config: &InviteConfig) -> Self {
        let credentials = config.credentials(agent.inbox_id());
        Self {
            agent,
            credentials,
            handlers: RwLock::new(Vec::new()),
            next_handler_id: AtomicU64::new(0),
        }
    }

    pub fn credentials(&self) -> &CreatorCredentials {
        &self.credentials
    }

    /// Register an invite handler; handlers run in registration order.
    pub async fn on_invite(&self, handler: Arc<dyn InviteEventHandler>) -> HandlerId {
        let id = HandlerId(self.next_handler_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().await.push((id, handler));
        id
    }

    /// Remove a previously registered handler.
    pub async fn off_invite(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write().await;
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Process one DM delivery end to end.
    ///
    /// # Errors
    /// Only substrate unavailability during classification propagates.
    /// Block and error-send failures are swallowed, and handler failures
    /// are contained and answered with a `GenericFailure` rejection.
    pub async fn process_dm(&self, delivery: DmDelivery) -> Result<DmOutcome, MiddlewareError> {
        let disposition =
            classify_dm(&delivery, &self.credentials, self.agent.as_ref()).await?;

        match disposition {
            DmDisposition::NotJoinRequest => Ok(DmOutcome::PassThrough),
            DmDisposition::BlockSender => {
                self.block_sender(&delivery.sender_inbox_id).await;
                Ok(DmOutcome::Blocked)
            }
            DmDisposition::SendError { kind, invite_tag } => {
                self.send_error(&delivery, kind, invite_tag).await;
                Ok(DmOutcome::ErrorSent)
            }
            DmDisposition::Invite(attempt) => {
                self.dispatch_invite(&delivery, *attempt).await;
                Ok(DmOutcome::InviteHandled)
            }
        }
    }

    /// Refresh the consent list, then block. Both steps are fire-and-forget.
    async fn block_sender(&self, sender_inbox_id: &str) {
        if let Err(error) = self.agent.refresh_consent_list().await {
            debug!(%error, "consent refresh failed");
        }
        let targets = vec![sender_inbox_id.to_string()];
        match self.agent.block(&targets).await {
            Ok(()) => info!(sender = %sender_inbox_id, "blocked sender"),
            Err(error) => debug!(%error, sender = %sender_inbox_id, "block failed"),
        }
    }

    /// Deliver a structured error on the DM. Failures are swallowed.
    async fn send_error(&self, delivery: &DmDelivery, kind: JoinErrorKind, invite_tag: String) {
        let content = JoinErrorContent::new(kind, invite_tag);
        let bytes = match content.encode() {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(%error, "join error encode failed");
                return;
            }
        };
        if let Err(error) = delivery.conversation.send(bytes).await {
            debug!(%error, "join error send failed");
        }
    }

    async fn dispatch_invite(&self, delivery: &DmDelivery, attempt: InviteAttempt) {
        let event = InviteEvent {
            joiner_inbox_id: attempt.joiner_inbox_id,
            conversation_id: attempt.conversation_id,
            invite_tag: attempt.invite.tag().to_string(),
            invite: attempt.invite,
            target: attempt.target,
            dm: delivery.conversation.clone(),
        };

        info!(
            joiner = %event.joiner_inbox_id(),
            conversation = %event.conversation_id(),
            tag = %event.invite_tag(),
            "join request verified"
        );

        // Snapshot so a handler calling on/off cannot deadlock the read lock.
        let handlers: Vec<Arc<dyn InviteEventHandler>> = self
            .handlers
            .read()
            .await
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            if let Err(handler_error) = handler.on_invite(&event).await {
                error!(error = %handler_error, "invite handler failed");
                if let Err(send_error) =
                    event.reject(Some(JoinErrorKind::GenericFailure)).await
                {
                    debug!(error = %send_error, "failure rejection send failed");
                }
            }
        }
    }
}
