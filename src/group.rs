//! Invite-capable wrapper over a substrate conversation.
//!
//! [`InviteGroup`] layers the metadata lifecycle onto a group the
//! substrate owns: metadata is created lazily the first time an invite or
//! profile needs it, and every mutation is an overwrite of the single
//! `app_data` string. The wrapper holds an [`InviteIssuer`] — credentials
//! plus URL configuration — rather than the middleware engine, so
//! ownership between the two stays acyclic.

use std::sync::Arc;

use tracing::info;

use crate::config::{CreatorCredentials, InviteConfig};
use crate::invite::{create_invite_slug, invite_url, InviteError, InviteOptions};
use crate::metadata::{decode_metadata, encode_metadata, MetadataError};
use crate::substrate::{Conversation, SubstrateError};
use crate::wire::{ConversationCustomMetadata, ConversationProfile};

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Invite(#[from] InviteError),
    #[error(transparent)]
    Substrate(#[from] SubstrateError),
}

/// The narrow minting capability an [`InviteGroup`] needs: who signs,
/// and what URL base invites are rendered under.
#[derive(Debug, Clone)]
pub struct InviteIssuer {
    credentials: CreatorCredentials,
    config: InviteConfig,
}

impl InviteIssuer {
    pub fn new(credentials: CreatorCredentials, config: InviteConfig) -> Self {
        Self {
            credentials,
            config,
        }
    }

    pub fn credentials(&self) -> &CreatorCredentials {
        &self.credentials
    }

    pub fn config(&self) -> &InviteConfig {
        &self.config
    }
}

/// A freshly minted invite.
#[derive(Debug, Clone)]
pub struct CreatedInvite {
    pub slug: String,
    pub url: String,
    /// The metadata tag the invite is bound to.
    pub tag: String,
}

/// Profile fields a member sets for themselves in a conversation.
#[derive(Debug, Clone, Default)]
pub struct ProfileOptions {
    pub name: Option<String>,
    pub image: Option<String>,
}

/// A substrate group with invite issuance and profile management.
pub struct InviteGroup {
    conversation: Arc<dyn Conversation>,
    issuer: InviteIssuer,
}

impl InviteGroup {
    pub fn new(conversation: Arc<dyn Conversation>, issuer: InviteIssuer) -> Self {
        Self {
            conversation,
            issuer,
        }
    }

    pub fn conversation(&self) -> &Arc<dyn Conversation> {
        &self.conversation
    }

    /// Mint an invite for this group.
    ///
    /// Reuses the current metadata tag when `app_data` decodes to metadata
    /// with a non-empty tag; otherwise generates and persists fresh
    /// metadata first, then signs a slug for the group id under that tag.
    pub async fn create_invite(&self, options: &InviteOptions) -> Result<CreatedInvite, GroupError> {
        let tag = self.current_or_fresh_tag().await?;
        let slug = create_invite_slug(
            &self.conversation.id(),
            &tag,
            self.issuer.credentials(),
            options,
        )?;
        let url = invite_url(&slug, self.issuer.config());
        info!(conversation = %self.conversation.id(), %tag, "minted invite");
        Ok(CreatedInvite { slug, url, tag })
    }

    /// Upsert this identity's profile in the conversation metadata.
    ///
    /// Undecodable `app_data` is replaced with fresh metadata rather than
    /// failing the profile write.
    pub async fn set_conversation_profile(
        &self,
        options: ProfileOptions,
    ) -> Result<(), GroupError> {
        let mut metadata = self.current_or_fresh_metadata().await?;
        metadata.upsert_profile(ConversationProfile {
            inbox_id: self.issuer.credentials().inbox_id().as_bytes().to_vec(),
            name: options.name,
            image: options.image,
        });
        self.persist(&metadata).await
    }

    /// Rotate the invite tag, invalidating every outstanding invite.
    ///
    /// The new metadata is persisted before the tag is returned, so an
    /// invite minted afterwards is always bound to stored state.
    pub async fn rotate_invite_tag(&self) -> Result<String, GroupError> {
        let metadata = self.current_or_fresh_metadata().await?.rotate_invite_tag();
        self.persist(&metadata).await?;
        info!(conversation = %self.conversation.id(), "rotated invite tag");
        Ok(metadata.tag)
    }

    async fn current_or_fresh_tag(&self) -> Result<String, GroupError> {
        if let Some(encoded) = self.conversation.app_data().await? {
            if let Ok(metadata) = decode_metadata(&encoded) {
                if !metadata.tag.is_empty() {
                    return Ok(metadata.tag);
                }
            }
        }
        let metadata = ConversationCustomMetadata::with_fresh_tag();
        self.persist(&metadata).await?;
        Ok(metadata.tag)
    }

    async fn current_or_fresh_metadata(&self) -> Result<ConversationCustomMetadata, GroupError> {
        Ok(match self.conversation.app_data().await? {
            Some(encoded) => decode_metadata(&encoded)
                .unwrap_or_else(|_| ConversationCustomMetadata::with_fresh_tag()),
            None => ConversationCustomMetadata::with_fresh_tag(),
        })
    }

    async fn persist(&self, metadata: &ConversationCustomMetadata) -> Result<(), GroupError> {
        let encoded = encode_metadata(metadata)?;
        self.conversation.update_app_data(encoded).await?;
        Ok(())
    }
}
