//! LiveKit connection settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use trunkline_types::InboundTrunkId;

/// Connection and SIP settings for one LiveKit project.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LiveKitConfig {
    /// Server URL (`wss://<project>.livekit.cloud` or `http://localhost:7880`).
    pub url: String,
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    /// SIP endpoint the telephony trunk forwards inbound calls to.
    #[serde(default)]
    pub sip_uri: String,
    /// Pre-provisioned outbound trunk for placing calls.
    #[serde(default)]
    pub outbound_trunk_id: Option<InboundTrunkId>,
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("sip_uri", &self.sip_uri)
            .field("outbound_trunk_id", &self.outbound_trunk_id)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            sip_uri: String::new(),
            outbound_trunk_id: None,
        }
    }

    /// The HTTP base for server (Twirp) API calls. LiveKit Cloud URLs are
    /// WebSocket-schemed; the server API lives at the same host over HTTP.
    pub fn http_url(&self) -> String {
        if let Some(rest) = self.url.strip_prefix("wss://") {
            format!("https://{}", rest)
        } else if let Some(rest) = self.url.strip_prefix("ws://") {
            format!("http://{}", rest)
        } else {
            self.url.trim_end_matches('/').to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secret() {
        let config = LiveKitConfig::new("wss://x.livekit.cloud", "key", "hunter2");
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn http_url_normalizes_websocket_schemes() {
        let mut config = LiveKitConfig::new("wss://x.livekit.cloud", "k", "s");
        assert_eq!(config.http_url(), "https://x.livekit.cloud");
        config.url = "ws://localhost:7880".to_string();
        assert_eq!(config.http_url(), "http://localhost:7880");
        config.url = "http://localhost:7880/".to_string();
        assert_eq!(config.http_url(), "http://localhost:7880");
    }
}
