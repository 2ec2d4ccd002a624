//! Per-stage timing output for the call pipeline.
//!
//! Two writers, matching the two consumers of timing data:
//!
//! - [`BatchLogger`] buffers rows in memory and writes one headered CSV file
//!   per process run under the log directory (`log_<YYYYmmdd_HHMMSS>.csv`).
//! - [`append_stage`] appends single unlabeled rows to a shared
//!   `metrics_log.csv` as each conversational turn completes.
//!
//! Both files are single-writer and append-only. Races between simultaneous
//! runs are possible and unhandled; timing is best-effort and must never
//! alter the conversational outcome, so the session-facing helper
//! [`append_stage_best_effort`] logs failures instead of returning them.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use trunkline_types::Stage;

/// Default path of the shared append-only stage log.
pub const STAGE_LOG_FILE: &str = "metrics_log.csv";

/// Errors from metrics file handling.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metrics csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Collects `(timestamp, component, duration)` rows and writes them out as
/// one CSV file per run.
#[derive(Debug)]
pub struct BatchLogger {
    rows: Vec<(String, String, f64)>,
    log_file: PathBuf,
}

impl BatchLogger {
    /// Creates a logger targeting `<log_dir>/log_<YYYYmmdd_HHMMSS>.csv`.
    ///
    /// The log directory is created if missing.
    pub fn new(log_dir: impl AsRef<Path>) -> Result<Self, MetricsError> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;
        let file_name = format!("log_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"));
        Ok(Self {
            rows: Vec::new(),
            log_file: log_dir.join(file_name),
        })
    }

    /// Buffers one component duration row, stamped now.
    pub fn log_component(&mut self, stage: Stage, duration_secs: f64) {
        self.rows.push((
            Utc::now().to_rfc3339(),
            stage.as_str().to_string(),
            duration_secs,
        ));
    }

    /// Writes the buffered rows with the
    /// `timestamp,component,duration_seconds` header and returns the path.
    pub fn save(&self) -> Result<PathBuf, MetricsError> {
        let mut writer = csv::Writer::from_writer(File::create(&self.log_file)?);
        writer.write_record(["timestamp", "component", "duration_seconds"])?;
        for (timestamp, component, duration) in &self.rows {
            writer.write_record([timestamp.as_str(), component, &format!("{:.3}", duration)])?;
        }
        writer.flush()?;
        Ok(self.log_file.clone())
    }

    /// Path the logger will write to.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

/// Appends one `timestamp,label,duration` row (no header) to the shared
/// stage log at `path`.
pub fn append_stage(path: impl AsRef<Path>, stage: Stage, duration_secs: f64) -> Result<(), MetricsError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record([
        Utc::now().to_rfc3339().as_str(),
        stage.as_str(),
        &format!("{:.2}", duration_secs),
    ])?;
    writer.flush()?;
    Ok(())
}

/// [`append_stage`], with failures logged and swallowed.
pub fn append_stage_best_effort(path: impl AsRef<Path>, stage: Stage, duration_secs: f64) {
    if let Err(e) = append_stage(path.as_ref(), stage, duration_secs) {
        tracing::warn!(
            stage = stage.as_str(),
            error = %e,
            "failed to append stage metric"
        );
    }
}

/// Returns the most recently modified `.csv` file under `dir`, if any.
///
/// Backs the `GET /download-logs` endpoint.
pub fn latest_log_file(dir: impl AsRef<Path>) -> Option<PathBuf> {
    let entries = fs::read_dir(dir.as_ref()).ok()?;
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .filter_map(|path| {
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((modified, path))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_logger_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = BatchLogger::new(dir.path()).unwrap();
        logger.log_component(Stage::Asr, 0.1234);
        logger.log_component(Stage::Llm, 1.5);
        logger.log_component(Stage::Tts, 0.5);
        logger.log_component(Stage::Total, 2.1234);

        let path = logger.save().unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,component,duration_seconds"
        );
        let rows: Vec<&str> = lines.collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].contains(",ASR,0.123"));
        assert!(rows[3].contains(",TOTAL,2.123"));
    }

    #[test]
    fn batch_logger_file_name_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let logger = BatchLogger::new(dir.path()).unwrap();
        let name = logger.log_file().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("log_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn append_stage_has_no_header_and_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STAGE_LOG_FILE);
        append_stage(&path, Stage::Llm, 1.005).unwrap();
        append_stage(&path, Stage::Total, 2.0).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(",LLM,1.00") || lines[0].contains(",LLM,1.01"));
        assert!(lines[1].contains(",TOTAL,2.00"));
        // No header row.
        assert!(!contents.contains("timestamp,component"));
    }

    #[test]
    fn best_effort_append_swallows_errors() {
        // Directory path as the target file: the write fails but must not panic.
        let dir = tempfile::tempdir().unwrap();
        append_stage_best_effort(dir.path(), Stage::Asr, 0.1);
    }

    #[test]
    fn latest_log_file_prefers_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("a.csv");
        let new = dir.path().join("b.csv");
        fs::write(&old, "x").unwrap();
        fs::write(&new, "y").unwrap();
        let earlier = std::time::SystemTime::now() - std::time::Duration::from_secs(600);
        let file = File::options().write(true).open(&old).unwrap();
        file.set_modified(earlier).unwrap();

        assert_eq!(latest_log_file(dir.path()), Some(new));
    }

    #[test]
    fn latest_log_file_ignores_non_csv_and_empty_dirs() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(latest_log_file(dir.path()), None);
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert_eq!(latest_log_file(dir.path()), None);
    }
}
