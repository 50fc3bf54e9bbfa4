//! Flat-file export of the event history.
//!
//! CSV fields are joined verbatim: values containing commas are not quoted.
//! None of the built-in labels contain one.

use crate::events::DetectionEvent;
use chrono_tz::Tz;
use std::fmt;
use std::path::Path;

/// File name offered for CSV downloads.
pub const EXPORT_FILE_NAME: &str = "retail_analytics_data.csv";

/// Fixed CSV header row.
pub const CSV_HEADER: &str = "Timestamp,Location,Expression,Confidence,Source";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Jsonl,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Jsonl => "jsonl",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "jsonl" => Ok(ExportFormat::Jsonl),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Renders event snapshots with timestamps in a fixed time zone.
#[derive(Debug, Clone, Copy)]
pub struct Exporter {
    timezone: Tz,
}

impl Exporter {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Render events as CSV, one row per event in snapshot order.
    pub fn to_csv(&self, events: &[DetectionEvent]) -> String {
        let mut lines = Vec::with_capacity(events.len() + 1);
        lines.push(CSV_HEADER.to_string());
        lines.extend(events.iter().map(|e| self.csv_row(e)));
        lines.join("\n")
    }

    fn csv_row(&self, event: &DetectionEvent) -> String {
        format!(
            "{},{},{},{},{}",
            event
                .timestamp()
                .with_timezone(&self.timezone)
                .format("%H:%M:%S"),
            event.location(),
            event.category(),
            event.confidence(),
            event.source()
        )
    }

    /// Render events in the requested format.
    pub fn render(
        &self,
        events: &[DetectionEvent],
        format: ExportFormat,
    ) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => Ok(self.to_csv(events)),
            ExportFormat::Json => serde_json::to_string_pretty(events)
                .map_err(|e| ExportError::SerializeError(e.to_string())),
            ExportFormat::Jsonl => {
                let lines = events
                    .iter()
                    .map(serde_json::to_string)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| ExportError::SerializeError(e.to_string()))?;
                Ok(lines.join("\n"))
            }
        }
    }

    /// Render and write events to `path`, creating parent directories.
    pub fn write(
        &self,
        path: &Path,
        events: &[DetectionEvent],
        format: ExportFormat,
    ) -> Result<(), ExportError> {
        let content = self.render(events, format)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::IoError(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ExportError::IoError(e.to_string()))
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

/// CSV with UTC timestamps.
pub fn to_csv(events: &[DetectionEvent]) -> String {
    Exporter::default().to_csv(events)
}

/// Export errors.
#[derive(Debug)]
pub enum ExportError {
    IoError(String),
    SerializeError(String),
    UnknownFormat(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::IoError(e) => write!(f, "IO error: {e}"),
            ExportError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ExportError::UnknownFormat(s) => write!(f, "Unknown export format: {s}"),
        }
    }
}

impl std::error::Error for ExportError {}
