//! Session activity log.
//!
//! Counts what the session produced and exported. Only counters are kept;
//! events themselves are never written here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Activity counters for the current session.
#[derive(Debug)]
pub struct SessionLog {
    /// Live detections synthesized
    live_detections: AtomicU64,
    /// Uploads classified successfully
    uploads_classified: AtomicU64,
    /// Uploads rejected for their media type
    uploads_rejected: AtomicU64,
    /// Events evicted from the bounded store
    events_evicted: AtomicU64,
    /// Histogram timer ticks
    histogram_ticks: AtomicU64,
    /// Rolling stats timer ticks
    stats_ticks: AtomicU64,
    /// Exports produced
    exports: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting counters
    persist_path: Option<PathBuf>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            live_detections: AtomicU64::new(0),
            uploads_classified: AtomicU64::new(0),
            uploads_rejected: AtomicU64::new(0),
            events_evicted: AtomicU64::new(0),
            histogram_ticks: AtomicU64::new(0),
            stats_ticks: AtomicU64::new(0),
            exports: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that accumulates onto counters saved at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous session counters: {e}");
        }

        log
    }

    pub fn record_live_detection(&self) {
        self.live_detections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload_classified(&self) {
        self.uploads_classified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload_rejected(&self) {
        self.uploads_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.events_evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_histogram_tick(&self) {
        self.histogram_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stats_tick(&self) {
        self.stats_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_export(&self) {
        self.exports.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current counters.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            live_detections: self.live_detections.load(Ordering::Relaxed),
            uploads_classified: self.uploads_classified.load(Ordering::Relaxed),
            uploads_rejected: self.uploads_rejected.load(Ordering::Relaxed),
            events_evicted: self.events_evicted.load(Ordering::Relaxed),
            histogram_ticks: self.histogram_ticks.load(Ordering::Relaxed),
            stats_ticks: self.stats_ticks.load(Ordering::Relaxed),
            exports: self.exports.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Activity:\n\
             - Live detections: {}\n\
             - Uploads classified: {}\n\
             - Uploads rejected: {}\n\
             - Events evicted from history: {}\n\
             - Histogram updates: {}\n\
             - Stats updates: {}\n\
             - Exports: {}\n\
             - Session duration: {} seconds\n\
             \n\
             All figures are simulated; no camera or model input is used.",
            stats.live_detections,
            stats.uploads_classified,
            stats.uploads_rejected,
            stats.events_evicted,
            stats.histogram_ticks,
            stats.stats_ticks,
            stats.exports,
            stats.session_duration_secs
        )
    }

    /// Save counters to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedCounters {
                live_detections: stats.live_detections,
                uploads_classified: stats.uploads_classified,
                uploads_rejected: stats.uploads_rejected,
                exports: stats.exports,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedCounters =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.live_detections
                    .store(persisted.live_detections, Ordering::Relaxed);
                self.uploads_classified
                    .store(persisted.uploads_classified, Ordering::Relaxed);
                self.uploads_rejected
                    .store(persisted.uploads_rejected, Ordering::Relaxed);
                self.exports.store(persisted.exports, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.live_detections.store(0, Ordering::Relaxed);
        self.uploads_classified.store(0, Ordering::Relaxed);
        self.uploads_rejected.store(0, Ordering::Relaxed);
        self.events_evicted.store(0, Ordering::Relaxed);
        self.histogram_ticks.store(0, Ordering::Relaxed);
        self.stats_ticks.store(0, Ordering::Relaxed);
        self.exports.store(0, Ordering::Relaxed);
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the session counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub live_detections: u64,
    pub uploads_classified: u64,
    pub uploads_rejected: u64,
    pub events_evicted: u64,
    pub histogram_ticks: u64,
    pub stats_ticks: u64,
    pub exports: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Counters carried over between runs.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCounters {
    live_detections: u64,
    uploads_classified: u64,
    uploads_rejected: u64,
    exports: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared session log.
pub type SharedSessionLog = Arc<SessionLog>;

pub fn create_shared_log() -> SharedSessionLog {
    Arc::new(SessionLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedSessionLog {
    Arc::new(SessionLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_log_counting() {
        let log = SessionLog::new();

        log.record_live_detection();
        log.record_live_detection();
        log.record_upload_rejected();

        let stats = log.stats();
        assert_eq!(stats.live_detections, 2);
        assert_eq!(stats.uploads_rejected, 1);
        assert_eq!(stats.uploads_classified, 0);
    }

    #[test]
    fn test_session_log_reset() {
        let log = SessionLog::new();

        log.record_export();
        log.record_histogram_tick();
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.exports, 0);
        assert_eq!(stats.histogram_ticks, 0);
    }

    #[test]
    fn test_summary_format() {
        let log = SessionLog::new();
        let summary = log.summary();

        assert!(summary.contains("Live detections"));
        assert!(summary.contains("Uploads rejected"));
        assert!(summary.contains("simulated"));
    }

    #[test]
    fn test_persistence_round_trip() {
        let path = std::env::temp_dir()
            .join("retail-emotion-log-test")
            .join(format!("{}.json", uuid::Uuid::new_v4()));

        let log = SessionLog::with_persistence(path.clone());
        log.record_live_detection();
        log.record_export();
        log.record_histogram_tick();
        log.save().unwrap();

        let reloaded = SessionLog::with_persistence(path.clone());
        let stats = reloaded.stats();
        assert_eq!(stats.live_detections, 1);
        assert_eq!(stats.exports, 1);
        // Timer ticks are per-session only
        assert_eq!(stats.histogram_ticks, 0);

        let _ = std::fs::remove_file(&path);
    }
}
