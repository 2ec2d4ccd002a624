//! Trunk resources and provisioning request documents.
//!
//! The Twilio-side types (`Trunk`, `OriginationUrl`) mirror the vendor's
//! resource model field-for-field so they deserialize straight from the
//! Elastic SIP Trunking API. The LiveKit-side types serialize into the
//! request documents consumed by the `lk` CLI.

use serde::{Deserialize, Serialize};

/// A Twilio Elastic SIP trunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trunk {
    /// Twilio resource identifier (`TKxxxx`).
    pub sid: String,
    /// Display name. The reconciler matches on this.
    pub friendly_name: String,
    /// Termination domain (`<name>.pstn.twilio.com`).
    pub domain_name: Option<String>,
}

/// An origination URL attached to a trunk.
///
/// Origination URLs tell the trunk where to forward inbound calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginationUrl {
    /// Twilio resource identifier (`OUxxxx`).
    pub sid: String,
    /// Display name.
    pub friendly_name: String,
    /// The SIP target, e.g. `sip:abc.sip.livekit.cloud`.
    pub sip_url: String,
    /// Load-balancing weight.
    pub weight: i64,
    /// Failover priority.
    pub priority: i64,
    /// Whether the URL is active.
    pub enabled: bool,
}

/// Parameters for creating an origination URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOriginationUrl {
    pub friendly_name: String,
    pub sip_url: String,
    pub weight: i64,
    pub priority: i64,
    pub enabled: bool,
}

impl NewOriginationUrl {
    /// The origination URL the reconciler creates for a LiveKit SIP target.
    ///
    /// Weight 1, priority 1, enabled — the single active forwarding target.
    pub fn livekit(sip_url: impl Into<String>) -> Self {
        Self {
            friendly_name: crate::LIVEKIT_URL_NAME.to_string(),
            sip_url: sip_url.into(),
            weight: 1,
            priority: 1,
            enabled: true,
        }
    }
}

/// A LiveKit SIP trunk identifier (`ST_`-prefixed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InboundTrunkId(String);

impl InboundTrunkId {
    /// Validates the `ST_` prefix and wraps the identifier.
    pub fn parse(s: &str) -> Result<Self, ParseTrunkIdError> {
        if s.starts_with(crate::TRUNK_ID_PREFIX) && s.len() > crate::TRUNK_ID_PREFIX.len() {
            Ok(Self(s.to_string()))
        } else {
            Err(ParseTrunkIdError(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InboundTrunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for InboundTrunkId {
    type Err = ParseTrunkIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error returned when a trunk identifier lacks the `ST_` prefix.
#[derive(Debug, Clone, thiserror::Error)]
#[error("not a LiveKit trunk id (expected ST_ prefix): {0:?}")]
pub struct ParseTrunkIdError(pub String);

/// Request document for `lk sip inbound create`.
///
/// Serializes to `{ "trunk": { "name": ..., "numbers": [...] } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundTrunkSpec {
    pub trunk: InboundTrunkBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundTrunkBody {
    pub name: String,
    pub numbers: Vec<String>,
}

impl InboundTrunkSpec {
    /// The inbound trunk document for a single accepted phone number.
    pub fn for_number(phone_number: impl Into<String>) -> Self {
        Self {
            trunk: InboundTrunkBody {
                name: "Inbound LiveKit Trunk".to_string(),
                numbers: vec![phone_number.into()],
            },
        }
    }
}

/// Request document for `lk sip dispatch-rule create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRuleSpec {
    pub name: String,
    pub trunk_ids: Vec<String>,
    pub rule: DispatchRuleBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRuleBody {
    #[serde(rename = "dispatchRuleIndividual")]
    pub individual: DispatchRuleIndividual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRuleIndividual {
    #[serde(rename = "roomPrefix")]
    pub room_prefix: String,
}

impl DispatchRuleSpec {
    /// A rule routing inbound calls on `trunk_id` into `call-`-prefixed rooms.
    pub fn individual(trunk_id: &InboundTrunkId) -> Self {
        Self {
            name: "Inbound Dispatch Rule".to_string(),
            trunk_ids: vec![trunk_id.as_str().to_string()],
            rule: DispatchRuleBody {
                individual: DispatchRuleIndividual {
                    room_prefix: crate::ROOM_PREFIX.to_string(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trunk_id_requires_prefix() {
        assert!(InboundTrunkId::parse("ST_BGckDMqrXEe2").is_ok());
        assert!(InboundTrunkId::parse("TK_BGckDMqrXEe2").is_err());
        assert!(InboundTrunkId::parse("ST_").is_err());
        assert!(InboundTrunkId::parse("").is_err());
    }

    #[test]
    fn trunk_id_display_is_passthrough() {
        let id = InboundTrunkId::parse("ST_abc123").unwrap();
        assert_eq!(id.to_string(), "ST_abc123");
        assert_eq!(id.as_str(), "ST_abc123");
    }

    #[test]
    fn inbound_spec_document_shape() {
        let spec = InboundTrunkSpec::for_number("+15551234567");
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["trunk"]["name"], "Inbound LiveKit Trunk");
        assert_eq!(json["trunk"]["numbers"][0], "+15551234567");
    }

    #[test]
    fn dispatch_rule_document_shape() {
        let id = InboundTrunkId::parse("ST_abc").unwrap();
        let spec = DispatchRuleSpec::individual(&id);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["name"], "Inbound Dispatch Rule");
        assert_eq!(json["trunk_ids"][0], "ST_abc");
        assert_eq!(json["rule"]["dispatchRuleIndividual"]["roomPrefix"], "call-");
    }

    #[test]
    fn livekit_origination_url_defaults() {
        let url = NewOriginationUrl::livekit("sip:abc.sip.livekit.cloud");
        assert_eq!(url.weight, 1);
        assert_eq!(url.priority, 1);
        assert!(url.enabled);
        assert_eq!(url.friendly_name, "LiveKit SIP URI");
    }
}
