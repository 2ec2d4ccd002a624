//! Places one outbound call: dispatches the agent into a fresh room, then
//! dials the configured number over the outbound SIP trunk.
//!
//! The number can be overridden with `--to <E.164>`; otherwise the
//! configured `PHONE_NUMBER` is dialed.

use tracing::{error, info, warn};
use trunkline_livekit::{place_call, CallOutcome, ServerApiClient};
use trunkline_server::config;
use trunkline_server::init_tracing;

#[tokio::main]
async fn main() {
    let (resolved_config_path, _) = config::resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("trunkline.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — cannot place a call without valid config");

    init_tracing(&config.logging);

    let livekit = match config.livekit_config() {
        Ok(livekit) => livekit,
        Err(e) => {
            error!(error = %e, "missing LiveKit configuration");
            std::process::exit(1);
        }
    };

    let override_number = phone_override();
    let phone_number = match override_number.as_deref() {
        Some(number) => number,
        None => match config.require_phone_number() {
            Ok(number) => number,
            Err(e) => {
                error!(error = %e, "no number to dial");
                std::process::exit(1);
            }
        },
    };

    let server_api = ServerApiClient::new(&livekit);
    match place_call(&server_api, &livekit, phone_number).await {
        Ok(CallOutcome::Placed {
            session,
            participant_id,
        }) => {
            info!(
                room = %session.room_name,
                participant_id = %participant_id,
                "call placed"
            );
        }
        Ok(CallOutcome::Failed { room_name, error }) => {
            // Dispatch went through but the dial failed; already logged in
            // detail by the call path.
            warn!(room = %room_name, error = %error, "call not placed");
        }
        Err(e) => {
            error!(error = %e, "failed to place call");
            std::process::exit(1);
        }
    }
}

/// Returns the number following a `--to` argument, if present.
fn phone_override() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--to" {
            return args.next();
        }
    }
    None
}
