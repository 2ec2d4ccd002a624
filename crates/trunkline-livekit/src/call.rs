//! Outbound call initiation.
//!
//! Places a call by dispatching the agent into a freshly named room and
//! creating a SIP participant on the pre-configured outbound trunk. SIP
//! participant failures are logged and returned as a typed outcome — they
//! never propagate (the call silently does not happen, no retry).

use chrono::Utc;
use tracing::{error, info};
use trunkline_types::{
    room_name_for, CallSession, InboundTrunkId, AGENT_NAME, PHONE_PARTICIPANT_IDENTITY,
};

use crate::{LiveKitConfig, LiveKitError, ServerApiClient};

/// Result of one outbound call attempt.
#[derive(Debug)]
pub enum CallOutcome {
    /// The SIP participant was created; the call is ringing.
    Placed {
        session: CallSession,
        participant_id: String,
    },
    /// Dispatch succeeded but the SIP participant could not be created.
    /// Already logged; callers observe the failure without an `Err`.
    Failed { room_name: String, error: String },
}

/// Places an outbound call to `phone_number`.
///
/// Fails fast (with no side effects) when the configured outbound trunk id
/// is missing or malformed. After the agent dispatch is created, SIP
/// participant errors are swallowed into [`CallOutcome::Failed`].
pub async fn place_call(
    server_api: &ServerApiClient,
    config: &LiveKitConfig,
    phone_number: &str,
) -> Result<CallOutcome, LiveKitError> {
    let trunk_id: &InboundTrunkId = match &config.outbound_trunk_id {
        Some(id) => id,
        None => {
            error!("SIP_OUTBOUND_TRUNK_ID is not set or invalid");
            return Err(LiveKitError::InvalidTrunkId);
        }
    };

    let room_name = room_name_for(phone_number, Utc::now());

    info!(agent = AGENT_NAME, room = %room_name, "creating agent dispatch");
    let dispatch = server_api
        .create_agent_dispatch(AGENT_NAME, &room_name, phone_number)
        .await?;
    info!(dispatch_id = %dispatch.id, "created dispatch");

    info!(phone = phone_number, room = %room_name, "dialing");
    match server_api
        .create_sip_participant(
            trunk_id,
            phone_number,
            &room_name,
            PHONE_PARTICIPANT_IDENTITY,
        )
        .await
    {
        Ok(participant) => {
            info!(
                participant_id = %participant.participant_id,
                sip_call_id = %participant.sip_call_id,
                "created SIP participant"
            );
            Ok(CallOutcome::Placed {
                session: CallSession {
                    room_name,
                    phone_number: phone_number.to_string(),
                    trunk_id: trunk_id.clone(),
                    participant_identity: PHONE_PARTICIPANT_IDENTITY.to_string(),
                },
                participant_id: participant.participant_id,
            })
        }
        Err(e) => {
            error!(error = %e, "error creating SIP participant");
            Ok(CallOutcome::Failed {
                room_name,
                error: e.to_string(),
            })
        }
    }
}
