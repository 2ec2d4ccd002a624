//! Per-call conversational session.
//!
//! Ties the language and speech backends to a room and drives one
//! transcribed utterance at a time. Each turn is timed per stage and
//! appended to the shared metrics log; timing failures never affect the
//! conversation.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};
use trunkline_livekit::RoomService;
use trunkline_metrics::{append_stage_best_effort, BatchLogger};
use trunkline_types::Stage;

use crate::llm::{ChatMessage, LlmClient, ToolCall};
use crate::tools::{self, ToolName};
use crate::tts::ElevenLabsClient;
use crate::AgentError;

/// Mono 16-bit PCM at the telephony pipeline's sample rate. Used to estimate
/// playout time from synthesized byte length.
const PLAYOUT_BYTES_PER_SECOND: f64 = 44_100.0;

const SYSTEM_PROMPT: &str = "You are a friendly voice assistant on a phone call. \
Keep replies short and conversational; they will be read aloud. \
Use the order_items tool to place orders, check_availability to answer \
scheduling questions, and end_call once the caller is done and you have said \
goodbye.";

/// Language backend seam. Production uses [`LlmClient`]; tests substitute a
/// scripted stub.
#[async_trait]
pub trait LanguageBackend: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&serde_json::Value>,
    ) -> Result<ChatMessage, AgentError>;
}

#[async_trait]
impl LanguageBackend for LlmClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&serde_json::Value>,
    ) -> Result<ChatMessage, AgentError> {
        LlmClient::complete(self, messages, tools).await
    }
}

/// Speech backend seam. Returns the synthesized audio so the session can
/// estimate playout time.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AgentError>;
}

#[async_trait]
impl SpeechBackend for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AgentError> {
        ElevenLabsClient::synthesize(self, text).await
    }
}

/// Room operations the session needs to end a call.
#[async_trait]
pub trait RoomControl: Send + Sync {
    async fn delete_room(&self, name: &str) -> Result<(), AgentError>;
}

#[async_trait]
impl RoomControl for RoomService {
    async fn delete_room(&self, name: &str) -> Result<(), AgentError> {
        RoomService::delete_room(self, name)
            .await
            .map_err(|e| AgentError::Room(e.to_string()))
    }
}

/// What a turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The agent replied and the call continues.
    Replied(String),
    /// The agent said goodbye and the room was deleted. The session is done;
    /// further turns are a caller bug.
    CallEnded,
}

/// One call's conversation state and backends.
pub struct AgentSession {
    language: Box<dyn LanguageBackend>,
    speech: Box<dyn SpeechBackend>,
    room: Box<dyn RoomControl>,
    room_name: String,
    metrics_path: PathBuf,
    batch: Option<BatchLogger>,
    messages: Vec<ChatMessage>,
}

impl AgentSession {
    pub fn new(
        language: Box<dyn LanguageBackend>,
        speech: Box<dyn SpeechBackend>,
        room: Box<dyn RoomControl>,
        room_name: impl Into<String>,
        metrics_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            language,
            speech,
            room,
            room_name: room_name.into(),
            metrics_path: metrics_path.into(),
            batch: None,
            messages: vec![ChatMessage::system(SYSTEM_PROMPT)],
        }
    }

    /// Also mirrors the per-turn stages into a per-run batch log file, the
    /// one served by the log-download endpoint.
    pub fn with_batch_logger(mut self, logger: BatchLogger) -> Self {
        self.batch = Some(logger);
        self
    }

    /// Runs one conversational turn on already-transcribed caller speech.
    ///
    /// `asr_seconds` is the upstream transcription latency, recorded as the
    /// turn's ASR stage. At most one tool round-trip happens per turn: tool
    /// results are fed back for one follow-up completion, and whatever that
    /// yields is spoken.
    pub async fn handle_turn(
        &mut self,
        input_text: &str,
        asr_seconds: f64,
    ) -> Result<TurnOutcome, AgentError> {
        let turn_start = Instant::now();
        self.messages.push(ChatMessage::user(input_text));

        let specs = tools::tool_specs();
        let llm_start = Instant::now();
        let mut reply = self.language.complete(&self.messages, Some(&specs)).await?;

        let mut end_call = false;
        if !reply.requested_tools().is_empty() {
            self.messages.push(reply.clone());
            for call in reply.requested_tools() {
                let result = match ToolName::parse(&call.function.name) {
                    Some(ToolName::OrderItems) => run_tool(tools::order_items, call),
                    Some(ToolName::CheckAvailability) => {
                        run_tool(tools::check_availability, call)
                    }
                    Some(ToolName::EndCall) => {
                        end_call = true;
                        "Call will end after the goodbye message.".to_string()
                    }
                    None => {
                        warn!(tool = %call.function.name, "model requested unknown tool");
                        format!("Unknown tool: {}", call.function.name)
                    }
                };
                info!(tool = %call.function.name, "executed tool");
                self.messages
                    .push(ChatMessage::tool_result(call.id.clone(), result));
            }
            reply = self.language.complete(&self.messages, Some(&specs)).await?;
        }
        let llm_seconds = llm_start.elapsed().as_secs_f64();

        let reply_text = reply.text().to_string();
        self.messages.push(ChatMessage::assistant(&reply_text));

        let tts_start = Instant::now();
        let audio = self.speech.synthesize(&reply_text).await?;
        let tts_seconds = tts_start.elapsed().as_secs_f64();

        let total_seconds = asr_seconds + turn_start.elapsed().as_secs_f64();
        self.record_stages(asr_seconds, llm_seconds, tts_seconds, total_seconds);

        if end_call {
            // Let the goodbye play out before tearing the room down.
            let playout = Duration::from_secs_f64(audio.len() as f64 / PLAYOUT_BYTES_PER_SECOND);
            info!(
                room = %self.room_name,
                playout_ms = playout.as_millis() as u64,
                "ending call"
            );
            tokio::time::sleep(playout).await;
            if let Err(e) = self.room.delete_room(&self.room_name).await {
                warn!(room = %self.room_name, error = %e, "failed to delete room");
            }
            return Ok(TurnOutcome::CallEnded);
        }

        Ok(TurnOutcome::Replied(reply_text))
    }

    fn record_stages(&mut self, asr: f64, llm: f64, tts: f64, total: f64) {
        let stages = [
            (Stage::Asr, asr),
            (Stage::Llm, llm),
            (Stage::Tts, tts),
            (Stage::Total, total),
        ];
        for (stage, duration) in stages {
            append_stage_best_effort(&self.metrics_path, stage, duration);
        }
        if let Some(batch) = &mut self.batch {
            for (stage, duration) in stages {
                batch.log_component(stage, duration);
            }
            if let Err(e) = batch.save() {
                warn!(error = %e, "failed to save batch log");
            }
        }
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }
}

/// Runs a tool and always produces a result string. Every requested tool
/// call must be answered in the history; an argument-parse failure is
/// reported back to the model, never propagated.
fn run_tool(tool: fn(&str) -> Result<String, AgentError>, call: &ToolCall) -> String {
    match tool(&call.function.arguments) {
        Ok(reply) => reply,
        Err(e) => {
            warn!(tool = %call.function.name, error = %e, "tool arguments did not parse");
            format!("Invalid arguments: {}", e)
        }
    }
}
