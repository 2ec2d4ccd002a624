//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;
use trunkline_livekit::LiveKitConfig;
use trunkline_types::InboundTrunkId;

/// Top-level configuration shared by every binary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Twilio trunking credentials.
    #[serde(default)]
    pub twilio: TwilioSettings,

    /// LiveKit project settings.
    #[serde(default)]
    pub livekit: LiveKitSettings,

    /// Agent backends and call settings.
    #[serde(default)]
    pub agent: AgentSettings,
}

/// Network configuration for the log-download HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trunkline_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Twilio API credentials.
#[derive(Clone, Default, Deserialize)]
pub struct TwilioSettings {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
}

impl fmt::Debug for TwilioSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioSettings")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

/// LiveKit project credentials and SIP endpoints.
#[derive(Clone, Default, Deserialize)]
pub struct LiveKitSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// SIP endpoint the Twilio trunk forwards inbound calls to.
    #[serde(default)]
    pub sip_uri: String,
    /// Pre-provisioned `ST_`-prefixed outbound trunk id.
    #[serde(default)]
    pub outbound_trunk_id: String,
}

impl fmt::Debug for LiveKitSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitSettings")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("sip_uri", &self.sip_uri)
            .field("outbound_trunk_id", &self.outbound_trunk_id)
            .finish()
    }
}

/// Agent backend credentials and call settings.
#[derive(Clone, Deserialize)]
pub struct AgentSettings {
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub elevenlabs_api_key: String,
    #[serde(default)]
    pub elevenlabs_voice_id: String,
    /// E.164 number to provision and dial.
    #[serde(default)]
    pub phone_number: String,
    /// Directory holding the per-run batch logs served by `/download-logs`.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Shared per-turn stage log.
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

impl fmt::Debug for AgentSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSettings")
            .field("openai_api_key", &"[REDACTED]")
            .field("elevenlabs_api_key", &"[REDACTED]")
            .field("elevenlabs_voice_id", &self.elevenlabs_voice_id)
            .field("phone_number", &self.phone_number)
            .field("log_dir", &self.log_dir)
            .field("metrics_path", &self.metrics_path)
            .finish()
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_metrics_path() -> String {
    trunkline_metrics::STAGE_LOG_FILE.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            elevenlabs_api_key: String::new(),
            elevenlabs_voice_id: String::new(),
            phone_number: String::new(),
            log_dir: default_log_dir(),
            metrics_path: default_metrics_path(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required credential was neither configured nor set in the
    /// environment.
    #[error("missing required configuration: set {0}")]
    Missing(&'static str),
}

impl Config {
    /// Twilio credentials, required for trunk reconciliation.
    pub fn require_twilio(&self) -> Result<(&str, &str), ConfigError> {
        if self.twilio.account_sid.is_empty() {
            return Err(ConfigError::Missing("TWILIO_ACCOUNT_SID"));
        }
        if self.twilio.auth_token.is_empty() {
            return Err(ConfigError::Missing("TWILIO_AUTH_TOKEN"));
        }
        Ok((&self.twilio.account_sid, &self.twilio.auth_token))
    }

    /// The SIP endpoint the trunk must forward to.
    pub fn require_sip_uri(&self) -> Result<&str, ConfigError> {
        if self.livekit.sip_uri.is_empty() {
            return Err(ConfigError::Missing("LIVEKIT_SIP_URI"));
        }
        Ok(&self.livekit.sip_uri)
    }

    /// The number to provision and dial.
    pub fn require_phone_number(&self) -> Result<&str, ConfigError> {
        if self.agent.phone_number.is_empty() {
            return Err(ConfigError::Missing("PHONE_NUMBER"));
        }
        Ok(&self.agent.phone_number)
    }

    /// Connection settings for the LiveKit server API.
    ///
    /// A malformed outbound trunk id is carried as `None`; the call path
    /// rejects it at dial time rather than at startup.
    pub fn livekit_config(&self) -> Result<LiveKitConfig, ConfigError> {
        if self.livekit.url.is_empty() {
            return Err(ConfigError::Missing("LIVEKIT_URL"));
        }
        if self.livekit.api_key.is_empty() {
            return Err(ConfigError::Missing("LIVEKIT_API_KEY"));
        }
        if self.livekit.api_secret.is_empty() {
            return Err(ConfigError::Missing("LIVEKIT_API_SECRET"));
        }

        let outbound_trunk_id = if self.livekit.outbound_trunk_id.is_empty() {
            None
        } else {
            match InboundTrunkId::parse(&self.livekit.outbound_trunk_id) {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring malformed SIP_OUTBOUND_TRUNK_ID");
                    None
                }
            }
        };

        Ok(LiveKitConfig {
            url: self.livekit.url.clone(),
            api_key: self.livekit.api_key.clone(),
            api_secret: self.livekit.api_secret.clone(),
            sip_uri: self.livekit.sip_uri.clone(),
            outbound_trunk_id,
        })
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `TRUNKLINE_HOST` / `TRUNKLINE_PORT` override `server.*`
/// - `TRUNKLINE_LOG_LEVEL` / `TRUNKLINE_LOG_JSON` override `logging.*`
/// - `TWILIO_ACCOUNT_SID` / `TWILIO_AUTH_TOKEN` override `twilio.*`
/// - `LIVEKIT_URL` / `LIVEKIT_API_KEY` / `LIVEKIT_API_SECRET` /
///   `LIVEKIT_SIP_URI` / `SIP_OUTBOUND_TRUNK_ID` override `livekit.*`
/// - `OPENAI_API_KEY` / `ELEVENLABS_API_KEY` / `ELEVENLABS_VOICE_ID` /
///   `PHONE_NUMBER` override `agent.*`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("TRUNKLINE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("TRUNKLINE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(level) = std::env::var("TRUNKLINE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("TRUNKLINE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    if let Ok(sid) = std::env::var("TWILIO_ACCOUNT_SID") {
        config.twilio.account_sid = sid;
    }
    if let Ok(token) = std::env::var("TWILIO_AUTH_TOKEN") {
        config.twilio.auth_token = token;
    }

    if let Ok(url) = std::env::var("LIVEKIT_URL") {
        config.livekit.url = url;
    }
    if let Ok(key) = std::env::var("LIVEKIT_API_KEY") {
        config.livekit.api_key = key;
    }
    if let Ok(secret) = std::env::var("LIVEKIT_API_SECRET") {
        config.livekit.api_secret = secret;
    }
    if let Ok(uri) = std::env::var("LIVEKIT_SIP_URI") {
        config.livekit.sip_uri = uri;
    }
    if let Ok(trunk_id) = std::env::var("SIP_OUTBOUND_TRUNK_ID") {
        config.livekit.outbound_trunk_id = trunk_id;
    }

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        config.agent.openai_api_key = key;
    }
    if let Ok(key) = std::env::var("ELEVENLABS_API_KEY") {
        config.agent.elevenlabs_api_key = key;
    }
    if let Ok(voice) = std::env::var("ELEVENLABS_VOICE_ID") {
        config.agent.elevenlabs_voice_id = voice;
    }
    if let Ok(number) = std::env::var("PHONE_NUMBER") {
        config.agent.phone_number = number;
    }

    Ok(config)
}

/// Resolves the config file path from the first CLI argument, then
/// `TRUNKLINE_CONFIG_PATH`, then the default.
pub fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty() && !value.starts_with('-'))
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("TRUNKLINE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_localhost() {
        let config = Config::default();
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.agent.log_dir, "logs");
        assert_eq!(config.agent.metrics_path, "metrics_log.csv");
    }

    #[test]
    fn toml_file_populates_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trunkline.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9090

[twilio]
account_sid = "AC123"
auth_token = "secret"

[livekit]
url = "wss://x.livekit.cloud"
api_key = "key"
api_secret = "sekrit"
sip_uri = "sip:x.sip.livekit.cloud"
outbound_trunk_id = "ST_abc"
"#,
        )
        .unwrap();

        let config = load_config(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.require_twilio().unwrap().0, "AC123");
        let livekit = config.livekit_config().unwrap();
        assert_eq!(livekit.url, "wss://x.livekit.cloud");
        assert_eq!(
            livekit.outbound_trunk_id.unwrap().as_str(),
            "ST_abc"
        );

        // Environment overrides beat the file. Checked here, sequentially,
        // so no other load_config call can observe the mutated environment.
        std::env::set_var("TRUNKLINE_PORT", "9001");
        std::env::set_var("TWILIO_AUTH_TOKEN", "env-token");
        let config = load_config(Some(path.to_str().unwrap())).unwrap();
        std::env::remove_var("TRUNKLINE_PORT");
        std::env::remove_var("TWILIO_AUTH_TOKEN");
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.twilio.auth_token, "env-token");
        assert_eq!(config.twilio.account_sid, "AC123");
    }

    #[test]
    fn missing_credentials_name_the_variable() {
        let config = Config::default();
        let err = config.require_twilio().unwrap_err();
        assert!(err.to_string().contains("TWILIO_ACCOUNT_SID"));
        let err = config.livekit_config().unwrap_err();
        assert!(err.to_string().contains("LIVEKIT_URL"));
        let err = config.require_phone_number().unwrap_err();
        assert!(err.to_string().contains("PHONE_NUMBER"));
    }

    #[test]
    fn malformed_trunk_id_degrades_to_none() {
        let mut config = Config::default();
        config.livekit.url = "wss://x".to_string();
        config.livekit.api_key = "k".to_string();
        config.livekit.api_secret = "s".to_string();
        config.livekit.outbound_trunk_id = "not-a-trunk-id".to_string();

        let livekit = config.livekit_config().unwrap();
        assert!(livekit.outbound_trunk_id.is_none());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = Config::default();
        config.twilio.auth_token = "hunter2".to_string();
        config.livekit.api_secret = "hunter3".to_string();
        config.agent.openai_api_key = "hunter4".to_string();
        config.agent.elevenlabs_api_key = "hunter5".to_string();

        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        for secret in ["hunter2", "hunter3", "hunter4", "hunter5"] {
            assert!(!debug.contains(secret), "{secret} leaked");
        }
    }
}
