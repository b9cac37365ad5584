//! # convos-invite: signed-invite credentials for E2EE conversations
//!
//! A library for minting, sharing, and consuming cryptographically signed
//! conversation invites over an external end-to-end-encrypted messaging
//! substrate. The creator of a conversation hands out compact,
//! URL-embeddable invite slugs; anyone holding a slug sends it back as a
//! direct message, and the creator's middleware verifies it, decrypts the
//! concealed conversation id, and admits the joiner.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Your Application                            │
//! └───────────────────────────────┬─────────────────────────────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         ▼                       ▼                       ▼
//! ┌───────────────┐      ┌───────────────┐      ┌───────────────┐
//! │  middleware   │      │ invite/token  │      │   substrate   │
//! │ (join engine) │      │   (codecs)    │      │ (capability)  │
//! └───────────────┘      └───────────────┘      └───────────────┘
//!         │                       │                       │
//!         └───────────────────────┼───────────────────────┘
//!                                 ▼
//!                        ┌───────────────┐
//!                        │ crypto/wire/  │
//!                        │   framing     │
//!                        └───────────────┘
//! ```
//!
//! ## Modules
//!
//! - **[`middleware`]** - DM classification and join-request dispatch
//! - **[`invite`]** - Build, parse, verify, and decrypt signed invites
//! - **[`group`]** - Invite issuance and profiles on a substrate group
//! - **[`metadata`]** - The per-conversation `app_data` container
//! - **[`token`]** - AEAD conversation tokens
//! - **[`content`]** - Structured join-error messages
//! - **[`substrate`]** - The messaging capability this crate consumes
//! - **[`crypto`]**, **[`wire`]**, **[`framing`]** - Primitives and codecs
//! - **[`config`]** - Keys, environments, and URL bases
//!
//! ## Quick Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use convos_invite::config::InviteConfig;
//! use convos_invite::middleware::JoinRequestMiddleware;
//!
//! let config = InviteConfig::from_env()?;
//! let middleware = JoinRequestMiddleware::new(agent.clone(), &config);
//!
//! // Register a handler that admits every verified joiner.
//! middleware.on_invite(Arc::new(AutoAccept)).await;
//!
//! // Feed DM deliveries from your substrate's message loop.
//! let outcome = middleware.process_dm(delivery).await?;
//! if !outcome.consumed() {
//!     // ordinary message, hand it to the next layer
//! }
//! ```

/// Keys, environments, and URL bases.
pub mod config;

/// Structured join-error messages.
pub mod content;

/// Cryptographic primitives: signing, key derivation, AEAD, encodings.
pub mod crypto;

/// Compression-aware framing for slugs and metadata.
pub mod framing;

/// Invite issuance and profile management on a substrate group.
pub mod group;

/// Signed-invite codec and the joiner-side flow.
pub mod invite;

/// Conversation metadata codec.
pub mod metadata;

/// Join-request middleware.
pub mod middleware;

/// The messaging substrate capability this crate consumes.
pub mod substrate;

/// Versioned AEAD conversation tokens.
pub mod token;

/// Protobuf wire messages.
pub mod wire;
