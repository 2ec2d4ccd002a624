//! Twilio Elastic SIP Trunking integration.
//!
//! Provides the REST client for trunk and origination URL resources, and the
//! reconciler that guarantees the account's LiveKit trunk forwards inbound
//! calls to the configured SIP target.
//!
//! The account is assumed to be single-trunk (trial accounts allow exactly
//! one): the reconciler never creates a trunk on its own. The opt-in
//! destructive path ([`rebuild_from_scratch`]) is the only code that does,
//! after deleting every existing trunk.

mod client;
mod reconcile;

pub use client::{TrunkingApi, TwilioClient};
pub use reconcile::{
    find_livekit_trunk, plan_origination, rebuild_from_scratch, reconcile, ReconcilePlan,
};

use thiserror::Error;

/// Errors from the trunking API and the reconciler.
#[derive(Debug, Error)]
pub enum TelephonyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Twilio API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// No trunk named `LiveKit Trunk` exists. Manual intervention required:
    /// trial accounts can hold only one trunk, so the reconciler refuses to
    /// create a second.
    #[error("no existing LiveKit trunk found; delete the current trunk manually or upgrade the account")]
    NoLiveKitTrunk,
}
