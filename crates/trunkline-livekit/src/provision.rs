//! Inbound trunk and dispatch rule provisioning via the `lk` CLI.
//!
//! The CLI is the narrow integration point: a request document is written to
//! a fixed file name, the tool is invoked on it, and the generated trunk
//! identifier is extracted from its standard output. A missing or failing
//! tool is non-fatal — callers receive `None`/`false` and skip downstream
//! provisioning (the trunk can always be created from the LiveKit Cloud
//! dashboard instead).

use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::{error, info, warn};
use trunkline_types::{DispatchRuleSpec, InboundTrunkId, InboundTrunkSpec};

use crate::LiveKitError;

/// Fixed request document names, matching what operators expect to find
/// next to the binary after a provisioning run.
const INBOUND_TRUNK_FILE: &str = "inbound_trunk.json";
const DISPATCH_RULE_FILE: &str = "dispatch_rule.json";

/// Timeout for CLI invocations.
const CLI_TIMEOUT: Duration = Duration::from_secs(30);

static TRUNK_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"ST_\w+").unwrap());

/// Extracts the first `ST_`-prefixed identifier from CLI output.
pub fn extract_trunk_id(stdout: &str) -> Option<InboundTrunkId> {
    TRUNK_ID_PATTERN
        .find(stdout)
        .and_then(|m| InboundTrunkId::parse(m.as_str()).ok())
}

/// Drives the `lk` CLI for SIP provisioning.
pub struct CliProvisioner {
    program: PathBuf,
    request_dir: PathBuf,
}

impl Default for CliProvisioner {
    fn default() -> Self {
        Self::new("lk", ".")
    }
}

impl CliProvisioner {
    /// `program` is the CLI binary (normally `lk`); `request_dir` is where
    /// the request documents are written.
    pub fn new(program: impl Into<PathBuf>, request_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            request_dir: request_dir.into(),
        }
    }

    /// Whether the CLI can be invoked (`<lk> --version` exits zero).
    pub async fn is_available(&self) -> bool {
        match Command::new(&self.program).arg("--version").output().await {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    /// Creates an inbound trunk accepting calls to `phone_number`.
    ///
    /// Returns `Ok(None)` when the CLI is missing, exits nonzero, or its
    /// output carries no trunk identifier — all non-fatal; the caller skips
    /// dispatch-rule provisioning. `Err` is reserved for local failures
    /// (writing the request document, spawning the subprocess).
    pub async fn create_inbound_trunk(
        &self,
        phone_number: &str,
    ) -> Result<Option<InboundTrunkId>, LiveKitError> {
        if !self.is_available().await {
            self.warn_cli_missing();
            return Ok(None);
        }

        let request_path = self.request_dir.join(INBOUND_TRUNK_FILE);
        self.write_request(&request_path, &InboundTrunkSpec::for_number(phone_number))?;

        let output = self
            .run(&["sip", "inbound", "create"], &request_path)
            .await?;
        let Some(output) = output else {
            return Ok(None);
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        match extract_trunk_id(&stdout) {
            Some(trunk_id) => {
                info!(trunk_id = %trunk_id, "created inbound trunk");
                Ok(Some(trunk_id))
            }
            None => {
                error!("could not find inbound trunk id in CLI output");
                Ok(None)
            }
        }
    }

    /// Creates a dispatch rule binding inbound calls on `trunk_id` to
    /// `call-`-prefixed rooms. Returns whether the rule was created.
    pub async fn create_dispatch_rule(
        &self,
        trunk_id: &InboundTrunkId,
    ) -> Result<bool, LiveKitError> {
        let request_path = self.request_dir.join(DISPATCH_RULE_FILE);
        self.write_request(&request_path, &DispatchRuleSpec::individual(trunk_id))?;

        let output = self
            .run(&["sip", "dispatch-rule", "create"], &request_path)
            .await?;
        let Some(output) = output else {
            return Ok(false);
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        info!(output = %stdout.trim(), "dispatch rule created");
        Ok(true)
    }

    fn write_request<T: serde::Serialize>(
        &self,
        path: &Path,
        document: &T,
    ) -> Result<(), LiveKitError> {
        std::fs::write(path, serde_json::to_string_pretty(document)?)?;
        Ok(())
    }

    /// Runs the CLI with `args` plus the request path. `Ok(None)` means the
    /// tool exited nonzero or timed out; stderr has already been logged.
    async fn run(
        &self,
        args: &[&str],
        request_path: &Path,
    ) -> Result<Option<std::process::Output>, LiveKitError> {
        let invocation = Command::new(&self.program)
            .args(args)
            .arg(request_path)
            .output();

        let output = match tokio::time::timeout(CLI_TIMEOUT, invocation).await {
            Ok(result) => result?,
            Err(_) => {
                error!(
                    program = %self.program.display(),
                    timeout_secs = CLI_TIMEOUT.as_secs(),
                    "CLI invocation timed out"
                );
                return Ok(None);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(stderr = %stderr.trim(), "error executing CLI command");
            return Ok(None);
        }
        Ok(Some(output))
    }

    fn warn_cli_missing(&self) {
        warn!("LiveKit CLI not found; install it or use the LiveKit Cloud dashboard");
        info!("to install the LiveKit CLI:");
        info!("1. via Homebrew: brew install livekit-cli");
        info!("2. via Chocolatey: choco install livekit-cli");
        info!("3. download from: https://github.com/livekit/livekit-cli/releases");
        info!("4. or configure the SIP trunk manually in the LiveKit Cloud dashboard");
    }
}
