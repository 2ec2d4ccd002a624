//! Provisions the inbound call path end to end: the Twilio trunk forwards
//! to LiveKit, LiveKit accepts the number on an inbound trunk, and a
//! dispatch rule places each caller in their own `call-` room.
//!
//! Pass `--rebuild` to delete every trunk on the Twilio account first and
//! recreate the LiveKit trunk from scratch. Irreversible; off by default.

use thiserror::Error;
use tracing::{error, info, warn};
use trunkline_livekit::{CliProvisioner, LiveKitError};
use trunkline_server::config::{self, Config, ConfigError};
use trunkline_server::init_tracing;
use trunkline_telephony::{rebuild_from_scratch, reconcile, TelephonyError, TwilioClient};

#[derive(Debug, Error)]
enum ProvisionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telephony(#[from] TelephonyError),

    #[error(transparent)]
    LiveKit(#[from] LiveKitError),
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, _) = config::resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("trunkline.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — provisioning cannot start without valid config");

    init_tracing(&config.logging);

    let rebuild = std::env::args().any(|arg| arg == "--rebuild");
    if let Err(e) = run(&config, rebuild).await {
        error!(error = %e, "provisioning failed");
        std::process::exit(1);
    }
}

async fn run(config: &Config, rebuild: bool) -> Result<(), ProvisionError> {
    let (account_sid, auth_token) = config.require_twilio()?;
    let sip_uri = config.require_sip_uri()?;
    let phone_number = config.require_phone_number()?;

    let twilio = TwilioClient::new(account_sid, auth_token);
    let trunk = if rebuild {
        warn!("rebuild requested: deleting every trunk on the account");
        rebuild_from_scratch(&twilio, sip_uri).await?
    } else {
        reconcile(&twilio, sip_uri).await?
    };
    info!(trunk_sid = %trunk.sid, "Twilio trunk forwards to LiveKit");

    let provisioner = CliProvisioner::default();
    let Some(trunk_id) = provisioner.create_inbound_trunk(phone_number).await? else {
        warn!("inbound trunk not created, skipping dispatch rule");
        return Ok(());
    };
    info!(trunk_id = %trunk_id, "created LiveKit inbound trunk");

    if provisioner.create_dispatch_rule(&trunk_id).await? {
        info!("created dispatch rule, inbound call path is ready");
    } else {
        warn!("dispatch rule not created, inbound calls will not be routed");
    }

    Ok(())
}
