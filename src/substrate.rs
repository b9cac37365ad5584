//! Messaging substrate capability.
//!
//! The invite engine never talks to a transport directly: it consumes the
//! narrow capability below, implemented by whatever end-to-end-encrypted
//! substrate hosts the conversations. Identity, group membership, storage,
//! and the consent list all belong to the substrate; this crate only reads
//! `app_data`, sends payloads, and asks for membership and consent changes.
//!
//! # Thread Safety
//!
//! Both traits require `Send + Sync`: deliveries may be processed from
//! async contexts and handles are shared as `Arc<dyn ...>` across handler
//! callbacks.

use std::sync::Arc;

use async_trait::async_trait;

/// Errors originating from the substrate boundary.
///
/// String payloads carry the underlying transport's error message. These
/// are human-readable but not structured — callers should treat them as
/// opaque diagnostic text, not match on their content.
#[derive(Debug, thiserror::Error)]
pub enum SubstrateError {
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("membership update failed: {0}")]
    MembershipUpdateFailed(String),
    #[error("consent update failed: {0}")]
    ConsentUpdateFailed(String),
    #[error("substrate unavailable: {0}")]
    Unavailable(String),

    #[error("an unknown error occurred: {0}")]
    Other(#[from] anyhow::Error),
}

/// Content of a delivered message, as much of it as this crate may see.
///
/// Substrate message objects are heterogeneous; the middleware observes
/// only this tagged view and the single [`extract_text`] capability, never
/// the concrete substrate type.
///
/// [`extract_text`]: MessageContent::extract_text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Bytes(Vec<u8>),
    Unknown,
}

impl MessageContent {
    pub fn extract_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// One direct-message delivery, the middleware's unit of work.
#[derive(Clone)]
pub struct DmDelivery {
    pub sender_inbox_id: String,
    pub content: MessageContent,
    /// The DM conversation the message arrived on; replies go here.
    pub conversation: Arc<dyn Conversation>,
}

/// Options for creating a group on the substrate.
#[derive(Debug, Clone, Default)]
pub struct CreateGroupOptions {
    pub name: Option<String>,
    pub description: Option<String>,
    pub app_data: Option<String>,
}

/// A conversation handle owned by the substrate.
#[async_trait]
pub trait Conversation: Send + Sync {
    fn id(&self) -> String;

    /// Deliver raw payload bytes to the conversation.
    async fn send(&self, bytes: Vec<u8>) -> Result<(), SubstrateError>;

    /// Deliver plain text. Substrates without a dedicated text path fall
    /// back to [`send`](Conversation::send).
    async fn send_text(&self, text: &str) -> Result<(), SubstrateError> {
        self.send(text.as_bytes().to_vec()).await
    }

    async fn add_members(&self, inbox_ids: &[String]) -> Result<(), SubstrateError>;

    /// The opaque per-conversation state string this crate persists
    /// metadata in.
    async fn app_data(&self) -> Result<Option<String>, SubstrateError>;

    async fn update_app_data(&self, app_data: String) -> Result<(), SubstrateError>;
}

/// The substrate itself: identity plus conversation and consent access.
#[async_trait]
pub trait MessagingAgent: Send + Sync {
    /// The hex inbox id of this agent's own identity.
    fn inbox_id(&self) -> String;

    async fn conversation_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Arc<dyn Conversation>>, SubstrateError>;

    async fn create_group(
        &self,
        members: &[String],
        options: CreateGroupOptions,
    ) -> Result<Arc<dyn Conversation>, SubstrateError>;

    async fn create_dm(&self, inbox_id: &str) -> Result<Arc<dyn Conversation>, SubstrateError>;

    async fn list_conversations(&self) -> Result<Vec<Arc<dyn Conversation>>, SubstrateError>;

    async fn refresh_consent_list(&self) -> Result<(), SubstrateError>;

    async fn block(&self, inbox_ids: &[String]) -> Result<(), SubstrateError>;
}
