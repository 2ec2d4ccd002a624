//! Shared types and constants for the Trunkline call pipeline.
//!
//! This crate provides the data model used across all Trunkline crates:
//! telephony trunk resources, LiveKit provisioning request documents, call
//! sessions, and metric stage labels. Every other crate in the workspace
//! depends only on `trunkline-types` for cross-cutting definitions, which
//! keeps the dependency graph acyclic.

mod call;
mod trunk;

pub use call::{room_name_for, CallSession, Stage};
pub use trunk::{
    DispatchRuleBody, DispatchRuleIndividual, DispatchRuleSpec, InboundTrunkBody, InboundTrunkId,
    InboundTrunkSpec, NewOriginationUrl, OriginationUrl, ParseTrunkIdError, Trunk,
};

/// Friendly name identifying "the" LiveKit trunk on the Twilio account.
///
/// The reconciler treats the account as single-trunk: at most one trunk
/// carries this name, and only that trunk is ever inspected or mutated.
pub const LIVEKIT_TRUNK_NAME: &str = "LiveKit Trunk";

/// Case-insensitive substring marking an origination URL as the LiveKit one.
pub const LIVEKIT_URL_MARKER: &str = "livekit";

/// Friendly name given to origination URLs created by the reconciler.
pub const LIVEKIT_URL_NAME: &str = "LiveKit SIP URI";

/// Prefix of LiveKit SIP trunk identifiers (`ST_xxxx`).
pub const TRUNK_ID_PREFIX: &str = "ST_";

/// Room-name prefix used by both the dispatch rule and outbound calls.
pub const ROOM_PREFIX: &str = "call-";

/// Identity assigned to the dialed phone leg in the room.
pub const PHONE_PARTICIPANT_IDENTITY: &str = "phone_user";

/// Name of the agent dispatched into call rooms.
pub const AGENT_NAME: &str = "trunkline-agent";
