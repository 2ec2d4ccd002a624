//! Trunkline server binary.
//!
//! Serves the log-download endpoint and, when the agent backends are
//! configured, runs the console agent worker alongside it. Shuts down
//! gracefully on SIGTERM/SIGINT.

use std::net::SocketAddr;

use chrono::Utc;
use tokio::net::TcpListener;
use trunkline_agent::{AgentSession, ElevenLabsClient, LlmClient, LlmConfig, TtsConfig};
use trunkline_livekit::RoomService;
use trunkline_server::config::{self, Config};
use trunkline_server::{http, init_tracing, worker};
use trunkline_types::room_name_for;

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = config::resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("trunkline.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the server cannot start without valid config");

    init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let app = http::app(config.agent.log_dir.clone());
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting trunkline server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    match build_session(&config) {
        Some(mut session) => {
            tokio::select! {
                () = worker::run_worker(&mut session) => {
                    tracing::info!("agent worker finished");
                }
                result = &mut server => {
                    report_server_exit(result);
                    return;
                }
            }
            report_server_exit(server.await);
        }
        None => {
            report_server_exit(server.await);
        }
    }

    tracing::info!("trunkline server shut down");
}

fn report_server_exit(result: Result<Result<(), std::io::Error>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "server error"),
        Err(e) => tracing::error!(error = %e, "server task panicked"),
    }
}

/// Builds the agent session when every backend is configured; otherwise the
/// process serves logs only.
fn build_session(config: &Config) -> Option<AgentSession> {
    let livekit = match config.livekit_config() {
        Ok(livekit) => livekit,
        Err(e) => {
            tracing::info!(reason = %e, "agent worker disabled, serving logs only");
            return None;
        }
    };
    if config.agent.openai_api_key.is_empty()
        || config.agent.elevenlabs_api_key.is_empty()
        || config.agent.elevenlabs_voice_id.is_empty()
        || config.agent.phone_number.is_empty()
    {
        tracing::info!("agent backends not configured, serving logs only");
        return None;
    }

    let language = LlmClient::new(LlmConfig {
        api_key: config.agent.openai_api_key.clone(),
        ..LlmConfig::default()
    });
    let speech = ElevenLabsClient::new(TtsConfig::new(
        config.agent.elevenlabs_api_key.clone(),
        config.agent.elevenlabs_voice_id.clone(),
    ));
    let rooms = RoomService::new(&livekit);
    let room_name = room_name_for(&config.agent.phone_number, Utc::now());

    tracing::info!(room = %room_name, "starting agent worker");
    let mut session = AgentSession::new(
        Box::new(language),
        Box::new(speech),
        Box::new(rooms),
        room_name,
        config.agent.metrics_path.clone(),
    );
    match trunkline_metrics::BatchLogger::new(&config.agent.log_dir) {
        Ok(logger) => session = session.with_batch_logger(logger),
        Err(e) => tracing::warn!(error = %e, "batch logging disabled"),
    }
    Some(session)
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
