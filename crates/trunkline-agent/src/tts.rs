//! ElevenLabs text-to-speech client.

use reqwest::Client;
use serde::Serialize;

use crate::AgentError;

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Configuration for speech synthesis.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub api_key: String,
    pub voice_id: String,
    pub model: String,
    /// Voice stability; lower values vary more between generations.
    pub stability: f64,
    pub similarity_boost: f64,
    /// Playback speed multiplier. Slightly below 1.0 reads more naturally
    /// over a phone line.
    pub speed: f64,
}

impl TtsConfig {
    pub fn new(api_key: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            model: "eleven_turbo_v2_5".to_string(),
            stability: 0.60,
            similarity_boost: 0.75,
            speed: 0.95,
        }
    }
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f64,
    similarity_boost: f64,
    speed: f64,
}

/// HTTP client for the ElevenLabs synthesis endpoint.
#[derive(Clone)]
pub struct ElevenLabsClient {
    client: Client,
    base_url: String,
    config: TtsConfig,
}

impl ElevenLabsClient {
    pub fn new(config: TtsConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: ELEVENLABS_BASE_URL.to_string(),
            config,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(config: TtsConfig, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            config,
        }
    }

    /// Synthesizes `text` and returns the encoded audio bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AgentError> {
        let url = format!("{}/text-to-speech/{}", self.base_url, self.config.voice_id);
        let request = SynthesisRequest {
            text,
            model_id: &self.config.model,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
                speed: self.config.speed,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Tts(format!("{}: {}", status.as_u16(), body)));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
