//! Join-request middleware.
//!
//! Every inbound DM runs through a two-stage pipeline modeled as
//! classification followed by dispatch:
//!
//! ```text
//! DmDelivery → classify_dm() → DmDisposition → process_dm() → DmOutcome
//! ```
//!
//! [`classify_dm`] decides *what* a delivery is — not a join request, a
//! malformed invite worth blocking over, an expired invite worth a
//! structured error, or a verified invite. [`JoinRequestMiddleware`]
//! performs the matching substrate actions and runs registered
//! [`InviteEventHandler`]s for verified invites.
//!
//! All cryptographic and format failures are consumed here and turn into
//! one of two externally visible outcomes: silently block the sender, or
//! deliver a structured error content message. Handler failures are
//! contained; nothing in this module raises across a handler boundary.
//! Substrate unavailability is the one thing that propagates to the
//! caller.

mod classify;
mod engine;
mod events;

pub use classify::{classify_dm, DmDisposition, InviteAttempt};
pub use engine::{DmOutcome, HandlerId, JoinRequestMiddleware};
pub use events::{InviteEvent, InviteEventHandler};

use crate::content::ContentError;
use crate::substrate::SubstrateError;

/// Errors surfaced by middleware operations.
#[derive(Debug, thiserror::Error)]
pub enum MiddlewareError {
    #[error(transparent)]
    Substrate(#[from] SubstrateError),

    #[error("content error: {0}")]
    Content(#[from] ContentError),

    /// Generic handler failure.
    #[error("handler error: {0}")]
    Handler(String),
}
