//! Console-driven agent worker.
//!
//! Feeds caller utterances into the session one line at a time. Transcription
//! happens upstream in the media pipeline, so the input is already text and
//! the ASR stage is recorded with zero latency.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use trunkline_agent::{AgentSession, TurnOutcome};

/// Drives the session until the call ends or input closes. Turn errors are
/// logged and the conversation continues; a failed turn must not drop the
/// call.
pub async fn run_worker(session: &mut AgentSession) {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("input closed, stopping worker");
                return;
            }
            Err(e) => {
                error!(error = %e, "failed to read input");
                return;
            }
        };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        match session.handle_turn(text, 0.0).await {
            Ok(TurnOutcome::Replied(reply)) => {
                println!("{reply}");
            }
            Ok(TurnOutcome::CallEnded) => {
                info!(room = session.room_name(), "call ended");
                return;
            }
            Err(e) => {
                error!(error = %e, "turn failed");
            }
        }
    }
}
