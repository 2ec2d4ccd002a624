//! The conversational agent session.
//!
//! Wires an LLM backend (with tool calling), a TTS backend, and the room
//! service into a per-call session. The session exposes three callback
//! tools — order items, check availability, end call — and measures each
//! turn's ASR/LLM/TTS stages into the shared metrics log.
//!
//! Speech recognition and media transport belong to the platform; the
//! session consumes already-transcribed text and publishes synthesized
//! audio back through the room.

mod llm;
mod session;
mod tools;
mod tts;

pub use llm::{ChatMessage, FunctionCall, LlmClient, LlmConfig, ToolCall};
pub use session::{AgentSession, LanguageBackend, RoomControl, SpeechBackend, TurnOutcome};
pub use tools::{check_availability, order_items, tool_specs, ToolName};
pub use tts::{ElevenLabsClient, TtsConfig};

use thiserror::Error;

/// Errors from the agent backends.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("room error: {0}")]
    Room(String),

    #[error("malformed tool arguments: {0}")]
    ToolArguments(#[from] serde_json::Error),
}
