//! Trunk reconciliation.
//!
//! Guarantees the account's `LiveKit Trunk` has an enabled origination URL
//! pointing at the target SIP URI, mutating the existing URL in place when it
//! is stale. Decision logic is a pure plan over the listed resources;
//! execution is a thin pass over the [`TrunkingApi`].

use rand::RngCore;
use tracing::{error, info};
use trunkline_types::{
    NewOriginationUrl, OriginationUrl, Trunk, LIVEKIT_TRUNK_NAME, LIVEKIT_URL_MARKER,
};

use crate::{TelephonyError, TrunkingApi};

/// What the reconciler will do to the matched trunk's origination URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilePlan {
    /// The matched URL already carries the target URI. No mutation.
    AlreadyConfigured { url_sid: String },
    /// The matched URL is stale; one in-place update.
    UpdateUrl { url_sid: String },
    /// No URL matches; one creation with weight 1, priority 1, enabled.
    CreateUrl,
}

/// Finds the trunk whose friendly name is exactly `LiveKit Trunk`.
pub fn find_livekit_trunk(trunks: &[Trunk]) -> Option<&Trunk> {
    trunks
        .iter()
        .find(|trunk| trunk.friendly_name == LIVEKIT_TRUNK_NAME)
}

/// Plans the origination URL mutation for the matched trunk.
///
/// A URL counts as "the" LiveKit URL when its friendly name contains
/// `livekit` (case-insensitive) or its URI already equals the target. The
/// first match in list order wins; other URLs — stale or not — are left
/// untouched.
pub fn plan_origination(urls: &[OriginationUrl], target_uri: &str) -> ReconcilePlan {
    let matched = urls.iter().find(|url| {
        url.friendly_name.to_lowercase().contains(LIVEKIT_URL_MARKER) || url.sip_url == target_uri
    });

    match matched {
        Some(url) if url.sip_url == target_uri => ReconcilePlan::AlreadyConfigured {
            url_sid: url.sid.clone(),
        },
        Some(url) => ReconcilePlan::UpdateUrl {
            url_sid: url.sid.clone(),
        },
        None => ReconcilePlan::CreateUrl,
    }
}

/// Ensures the LiveKit trunk forwards to `target_uri`.
///
/// Precondition: the account already holds a trunk named `LiveKit Trunk`.
/// If it does not, this returns [`TelephonyError::NoLiveKitTrunk`] without
/// creating or mutating anything — callers must treat that as fatal.
pub async fn reconcile<A: TrunkingApi + ?Sized>(
    api: &A,
    target_uri: &str,
) -> Result<Trunk, TelephonyError> {
    let trunks = api.list_trunks().await?;
    let Some(trunk) = find_livekit_trunk(&trunks) else {
        error!("no existing LiveKit trunk found, but trial accounts can only have one trunk");
        error!("delete the existing trunk manually from the Twilio console or upgrade the account");
        return Err(TelephonyError::NoLiveKitTrunk);
    };
    info!(trunk_sid = %trunk.sid, "found existing LiveKit trunk");

    let urls = api.list_origination_urls(&trunk.sid).await?;
    match plan_origination(&urls, target_uri) {
        ReconcilePlan::AlreadyConfigured { .. } => {
            info!("SIP URI already configured correctly");
        }
        ReconcilePlan::UpdateUrl { url_sid } => {
            api.update_origination_url(&trunk.sid, &url_sid, target_uri)
                .await?;
            info!(sip_uri = target_uri, "updated existing origination URL");
        }
        ReconcilePlan::CreateUrl => {
            api.create_origination_url(&trunk.sid, &NewOriginationUrl::livekit(target_uri))
                .await?;
            info!(sip_uri = target_uri, "added new origination URL");
        }
    }

    Ok(trunk.clone())
}

/// Deletes every trunk on the account and recreates the LiveKit trunk from
/// scratch with a fresh random domain.
///
/// Irreversible for unrelated trunks — manual opt-in only, never invoked by
/// the default provisioning flow.
pub async fn rebuild_from_scratch<A: TrunkingApi + ?Sized>(
    api: &A,
    target_uri: &str,
) -> Result<Trunk, TelephonyError> {
    for trunk in api.list_trunks().await? {
        info!(trunk_sid = %trunk.sid, name = %trunk.friendly_name, "deleting trunk");
        api.delete_trunk(&trunk.sid).await?;
    }

    let mut suffix = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut suffix);
    let domain_name = format!(
        "livekit-trunk-{:02x}{:02x}{:02x}{:02x}.pstn.twilio.com",
        suffix[0], suffix[1], suffix[2], suffix[3]
    );

    let trunk = api.create_trunk(LIVEKIT_TRUNK_NAME, &domain_name).await?;
    api.create_origination_url(&trunk.sid, &NewOriginationUrl::livekit(target_uri))
        .await?;

    info!(trunk_sid = %trunk.sid, domain = %domain_name, "created new LiveKit trunk");
    Ok(trunk)
}
