//! Session turns against scripted backends.

use std::collections::VecDeque;
use std::fs;
use std::sync::Mutex;

use async_trait::async_trait;
use trunkline_agent::{
    AgentError, AgentSession, ChatMessage, FunctionCall, LanguageBackend, RoomControl,
    SpeechBackend, ToolCall, TurnOutcome,
};

/// Replays a fixed sequence of assistant messages and records what it saw.
struct ScriptedLanguage {
    replies: Mutex<VecDeque<ChatMessage>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLanguage {
    fn new(replies: Vec<ChatMessage>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LanguageBackend for ScriptedLanguage {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&serde_json::Value>,
    ) -> Result<ChatMessage, AgentError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted"))
    }
}

struct StubSpeech {
    spoken: Mutex<Vec<String>>,
}

impl StubSpeech {
    fn new() -> Self {
        Self {
            spoken: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SpeechBackend for StubSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AgentError> {
        self.spoken.lock().unwrap().push(text.to_string());
        // A handful of bytes keeps the playout estimate near zero.
        Ok(vec![0u8; 16])
    }
}

struct StubRoom {
    deleted: Mutex<Vec<String>>,
}

impl StubRoom {
    fn new() -> Self {
        Self {
            deleted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RoomControl for StubRoom {
    async fn delete_room(&self, name: &str) -> Result<(), AgentError> {
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

fn tool_call(id: &str, name: &str, arguments: &str) -> ChatMessage {
    ChatMessage {
        role: "assistant".to_string(),
        content: None,
        tool_calls: Some(vec![ToolCall {
            id: id.to_string(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }]),
        tool_call_id: None,
    }
}

fn metrics_labels(path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split(',').nth(1).unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn plain_reply_speaks_and_logs_four_stages() {
    let dir = tempfile::tempdir().unwrap();
    let metrics = dir.path().join("metrics_log.csv");
    let speech = Box::new(StubSpeech::new());
    let mut session = AgentSession::new(
        Box::new(ScriptedLanguage::new(vec![ChatMessage::assistant(
            "We open at nine.",
        )])),
        speech,
        Box::new(StubRoom::new()),
        "call-1-1",
        &metrics,
    );

    let outcome = session.handle_turn("When do you open?", 0.5).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Replied("We open at nine.".to_string()));
    assert_eq!(
        metrics_labels(&metrics),
        ["ASR", "LLM", "TTS", "TOTAL"]
    );
}

#[tokio::test]
async fn batch_logger_mirrors_stage_rows() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");
    let logger = trunkline_metrics::BatchLogger::new(&log_dir).unwrap();
    let log_file = logger.log_file().to_path_buf();

    let mut session = AgentSession::new(
        Box::new(ScriptedLanguage::new(vec![ChatMessage::assistant("Hi!")])),
        Box::new(StubSpeech::new()),
        Box::new(StubRoom::new()),
        "call-1-1",
        dir.path().join("metrics_log.csv"),
    )
    .with_batch_logger(logger);

    session.handle_turn("Hello", 0.25).await.unwrap();

    let contents = fs::read_to_string(&log_file).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "timestamp,component,duration_seconds");
    assert_eq!(lines.len(), 5);
    assert!(lines[1].contains(",ASR,0.250"));
    assert!(lines[4].contains(",TOTAL,"));
}

#[tokio::test]
async fn tool_round_feeds_result_back_once() {
    let dir = tempfile::tempdir().unwrap();
    let metrics = dir.path().join("metrics_log.csv");
    let language = ScriptedLanguage::new(vec![
        tool_call("call_1", "order_items", r#"{"item_name":"widgets","quantity":3}"#),
        ChatMessage::assistant("Your order is in!"),
    ]);

    let mut session = AgentSession::new(
        Box::new(language),
        Box::new(StubSpeech::new()),
        Box::new(StubRoom::new()),
        "call-1-1",
        &metrics,
    );

    let outcome = session.handle_turn("Three widgets please", 0.0).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Replied("Your order is in!".to_string()));
    assert_eq!(metrics_labels(&metrics).len(), 4);
}

#[tokio::test]
async fn second_completion_sees_tool_result() {
    let dir = tempfile::tempdir().unwrap();
    let language = ScriptedLanguage::new(vec![
        tool_call("call_1", "check_availability", r#"{"date":"tomorrow"}"#),
        ChatMessage::assistant("Yes, we're open."),
    ]);
    let seen_handle: &'static ScriptedLanguage = Box::leak(Box::new(language));

    let mut session = AgentSession::new(
        Box::new(ForwardingLanguage(seen_handle)),
        Box::new(StubSpeech::new()),
        Box::new(StubRoom::new()),
        "call-1-1",
        dir.path().join("metrics_log.csv"),
    );

    session
        .handle_turn("Are you open tomorrow?", 0.0)
        .await
        .unwrap();

    let seen = seen_handle.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    let followup = &seen[1];
    let tool_message = followup
        .iter()
        .find(|m| m.role == "tool")
        .expect("tool result fed back");
    assert_eq!(tool_message.text(), "true");
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
}

#[tokio::test]
async fn malformed_tool_arguments_answer_the_call_instead_of_failing() {
    let dir = tempfile::tempdir().unwrap();
    let language = ScriptedLanguage::new(vec![
        // Truncated JSON, as a model can produce when cut off mid-arguments.
        tool_call("call_1", "order_items", r#"{"item_name":"widg"#),
        ChatMessage::assistant("Sorry, could you repeat that?"),
        ChatMessage::assistant("Three widgets, coming up."),
    ]);
    let seen_handle: &'static ScriptedLanguage = Box::leak(Box::new(language));

    let mut session = AgentSession::new(
        Box::new(ForwardingLanguage(seen_handle)),
        Box::new(StubSpeech::new()),
        Box::new(StubRoom::new()),
        "call-1-1",
        dir.path().join("metrics_log.csv"),
    );

    // The turn completes normally; the parse failure stays inside the tool
    // round-trip.
    let outcome = session.handle_turn("Order widgets", 0.0).await.unwrap();
    assert_eq!(
        outcome,
        TurnOutcome::Replied("Sorry, could you repeat that?".to_string())
    );

    // The tool_calls message is answered in-history, so the next turn's
    // request is well-formed.
    session.handle_turn("Three widgets", 0.0).await.unwrap();
    let seen = seen_handle.seen.lock().unwrap();
    let last_history = seen.last().unwrap();
    let answer = last_history
        .iter()
        .find(|m| m.tool_call_id.as_deref() == Some("call_1"))
        .expect("malformed tool call must still be answered");
    assert!(answer.text().starts_with("Invalid arguments"));
    for message in last_history.iter().filter(|m| !m.requested_tools().is_empty()) {
        for call in message.requested_tools() {
            assert!(
                last_history
                    .iter()
                    .any(|m| m.tool_call_id.as_deref() == Some(call.id.as_str())),
                "tool call {} left unanswered",
                call.id
            );
        }
    }
}

struct ForwardingLanguage(&'static ScriptedLanguage);

#[async_trait]
impl LanguageBackend for ForwardingLanguage {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&serde_json::Value>,
    ) -> Result<ChatMessage, AgentError> {
        self.0.complete(messages, tools).await
    }
}

#[tokio::test]
async fn end_call_deletes_room_after_goodbye() {
    let dir = tempfile::tempdir().unwrap();
    let room = StubRoom::new();
    let room_handle: &'static StubRoom = Box::leak(Box::new(room));

    let language = ScriptedLanguage::new(vec![
        tool_call("call_9", "end_call", "{}"),
        ChatMessage::assistant("Goodbye!"),
    ]);

    let mut session = AgentSession::new(
        Box::new(language),
        Box::new(StubSpeech::new()),
        Box::new(ForwardingRoom(room_handle)),
        "call-555-42",
        dir.path().join("metrics_log.csv"),
    );

    let outcome = session.handle_turn("That's all, bye", 0.0).await.unwrap();
    assert_eq!(outcome, TurnOutcome::CallEnded);
    assert_eq!(*room_handle.deleted.lock().unwrap(), ["call-555-42"]);
}

struct ForwardingRoom(&'static StubRoom);

#[async_trait]
impl RoomControl for ForwardingRoom {
    async fn delete_room(&self, name: &str) -> Result<(), AgentError> {
        self.0.delete_room(name).await
    }
}
