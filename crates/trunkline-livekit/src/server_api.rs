//! LiveKit server (Twirp) API client.
//!
//! The SIP and agent-dispatch services are not wrapped by the room client,
//! so this module posts their Twirp JSON endpoints directly, authenticating
//! with a short-lived HS256 JWT that carries both video and SIP grants.

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use trunkline_types::InboundTrunkId;

use crate::{LiveKitConfig, LiveKitError};

/// Lifetime of minted server-API tokens.
const TOKEN_TTL_SECONDS: i64 = 600;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    sub: String,
    nbf: i64,
    exp: i64,
    video: VideoGrant,
    sip: SipGrant,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoGrant {
    room_create: bool,
    room_admin: bool,
    room: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SipGrant {
    admin: bool,
    call: bool,
}

/// A SIP participant created for an outbound call leg.
#[derive(Debug, Clone, Deserialize)]
pub struct SipParticipant {
    #[serde(alias = "participantId", default)]
    pub participant_id: String,
    #[serde(alias = "participantIdentity", default)]
    pub participant_identity: String,
    #[serde(alias = "roomName", default)]
    pub room_name: String,
    #[serde(alias = "sipCallId", default)]
    pub sip_call_id: String,
}

/// A created agent dispatch.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentDispatch {
    #[serde(default)]
    pub id: String,
    #[serde(alias = "agentName", default)]
    pub agent_name: String,
    #[serde(default)]
    pub room: String,
}

#[derive(Serialize)]
struct CreateSipParticipantRequest<'a> {
    sip_trunk_id: &'a str,
    sip_call_to: &'a str,
    room_name: &'a str,
    participant_identity: &'a str,
}

#[derive(Serialize)]
struct CreateDispatchRequest<'a> {
    agent_name: &'a str,
    room: &'a str,
    metadata: &'a str,
}

/// Client for the SIP and agent-dispatch Twirp services.
#[derive(Clone)]
pub struct ServerApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl ServerApiClient {
    pub fn new(config: &LiveKitConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.http_url(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    /// Dials `phone_number` on `trunk_id` into `room_name` as a SIP
    /// participant with the given identity.
    pub async fn create_sip_participant(
        &self,
        trunk_id: &InboundTrunkId,
        phone_number: &str,
        room_name: &str,
        participant_identity: &str,
    ) -> Result<SipParticipant, LiveKitError> {
        let request = CreateSipParticipantRequest {
            sip_trunk_id: trunk_id.as_str(),
            sip_call_to: phone_number,
            room_name,
            participant_identity,
        };
        self.post("livekit.SIP/CreateSIPParticipant", room_name, &request)
            .await
    }

    /// Requests that `agent_name` be instantiated in `room`, with the
    /// metadata passed through opaquely for the agent to consume.
    pub async fn create_agent_dispatch(
        &self,
        agent_name: &str,
        room: &str,
        metadata: &str,
    ) -> Result<AgentDispatch, LiveKitError> {
        let request = CreateDispatchRequest {
            agent_name,
            room,
            metadata,
        };
        self.post("livekit.AgentDispatchService/CreateDispatch", room, &request)
            .await
    }

    async fn post<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        rpc: &str,
        room: &str,
        body: &T,
    ) -> Result<R, LiveKitError> {
        let token = self.mint_token(room)?;
        let response = self
            .client
            .post(format!("{}/twirp/{}", self.base_url, rpc))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LiveKitError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Mints a short-lived token scoped to `room` with room-admin and SIP
    /// grants.
    fn mint_token(&self, room: &str) -> Result<String, LiveKitError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: self.api_key.clone(),
            sub: self.api_key.clone(),
            nbf: now,
            exp: now + TOKEN_TTL_SECONDS,
            video: VideoGrant {
                room_create: true,
                room_admin: true,
                room: room.to_string(),
            },
            sip: SipGrant {
                admin: true,
                call: true,
            },
        };
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.api_secret.as_bytes()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    fn client() -> ServerApiClient {
        ServerApiClient::new(&LiveKitConfig::new(
            "wss://demo.livekit.cloud",
            "devkey",
            "secret",
        ))
    }

    #[test]
    fn minted_token_carries_video_and_sip_grants() {
        let token = client().mint_token("call-123").unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &validation,
        )
        .expect("token must decode with the api secret");

        assert_eq!(data.claims.iss, "devkey");
        assert!(data.claims.video.room_admin);
        assert!(data.claims.video.room_create);
        assert_eq!(data.claims.video.room, "call-123");
        assert!(data.claims.sip.admin);
        assert!(data.claims.sip.call);
        assert!(data.claims.exp > data.claims.nbf);
    }

    #[test]
    fn video_grant_serializes_camel_case() {
        let grant = VideoGrant {
            room_create: true,
            room_admin: true,
            room: "r".to_string(),
        };
        let json = serde_json::to_value(&grant).unwrap();
        assert_eq!(json["roomCreate"], true);
        assert_eq!(json["roomAdmin"], true);
    }

    #[test]
    fn sip_participant_accepts_camel_case_response() {
        let body = r#"{
            "participantId": "PA_abc",
            "participantIdentity": "phone_user",
            "roomName": "call-1",
            "sipCallId": "SC_xyz"
        }"#;
        let participant: SipParticipant = serde_json::from_str(body).unwrap();
        assert_eq!(participant.participant_id, "PA_abc");
        assert_eq!(participant.participant_identity, "phone_user");
        assert_eq!(participant.room_name, "call-1");
        assert_eq!(participant.sip_call_id, "SC_xyz");
    }

    #[test]
    fn sip_participant_accepts_snake_case_response() {
        let body = r#"{"participant_id": "PA_1", "room_name": "call-2"}"#;
        let participant: SipParticipant = serde_json::from_str(body).unwrap();
        assert_eq!(participant.participant_id, "PA_1");
        assert_eq!(participant.room_name, "call-2");
        assert_eq!(participant.sip_call_id, "");
    }

    #[test]
    fn create_requests_serialize_proto_field_names() {
        let trunk_request = CreateSipParticipantRequest {
            sip_trunk_id: "ST_1",
            sip_call_to: "+15551234567",
            room_name: "call-1",
            participant_identity: "phone_user",
        };
        let json = serde_json::to_value(&trunk_request).unwrap();
        assert_eq!(json["sip_trunk_id"], "ST_1");
        assert_eq!(json["sip_call_to"], "+15551234567");

        let dispatch_request = CreateDispatchRequest {
            agent_name: "trunkline-agent",
            room: "call-1",
            metadata: "+15551234567",
        };
        let json = serde_json::to_value(&dispatch_request).unwrap();
        assert_eq!(json["agent_name"], "trunkline-agent");
        assert_eq!(json["metadata"], "+15551234567");
    }
}
