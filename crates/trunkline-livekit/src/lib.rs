//! LiveKit integration for the Trunkline call pipeline.
//!
//! Covers the three ways this system talks to LiveKit:
//!
//! - the room service (via the `livekit-api` SDK) for deleting call rooms
//!   and inspecting participants,
//! - the server (Twirp) API for creating SIP participants and agent
//!   dispatches, authenticated with short-lived JWTs,
//! - the `lk` CLI, driven as a subprocess, for provisioning inbound trunks
//!   and dispatch rules from JSON request documents.

mod call;
mod config;
mod provision;
mod rooms;
mod server_api;

pub use call::{place_call, CallOutcome};
pub use config::LiveKitConfig;
pub use provision::{extract_trunk_id, CliProvisioner};
pub use rooms::RoomService;
pub use server_api::{AgentDispatch, ServerApiClient, SipParticipant};

use thiserror::Error;

/// Errors from the LiveKit integrations.
#[derive(Debug, Error)]
pub enum LiveKitError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("room service error: {0}")]
    RoomService(String),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize request document: {0}")]
    RequestDocument(#[from] serde_json::Error),

    #[error("SIP_OUTBOUND_TRUNK_ID is not set or invalid")]
    InvalidTrunkId,
}
