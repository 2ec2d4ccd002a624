//! Call sessions and pipeline stage labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::InboundTrunkId;

/// One outbound call attempt. Exists only for the duration of the attempt;
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSession {
    /// Room the call is connected to.
    pub room_name: String,
    /// Dialed number in E.164 format.
    pub phone_number: String,
    /// Outbound trunk carrying the call.
    pub trunk_id: InboundTrunkId,
    /// Identity of the phone leg in the room.
    pub participant_identity: String,
}

/// Derives a room name from a phone number and a timestamp.
///
/// Call-sign characters (`+`, `-`, spaces, parentheses) are stripped and the
/// unix-seconds timestamp appended: `call-15551234567-1724900000`. The coarse
/// timestamp reduces, but does not guarantee, collision between concurrent
/// calls to the same number.
pub fn room_name_for(phone_number: &str, now: DateTime<Utc>) -> String {
    let digits: String = phone_number
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("{}{}-{}", crate::ROOM_PREFIX, digits, now.timestamp())
}

/// Pipeline stage measured by the per-turn timing hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    Asr,
    Llm,
    Tts,
    Total,
}

impl Stage {
    /// Uppercase label written to the metrics CSV.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asr => "ASR",
            Self::Llm => "LLM",
            Self::Tts => "TTS",
            Self::Total => "TOTAL",
        }
    }
}
