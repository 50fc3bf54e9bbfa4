//! Derived views over detection events.
//!
//! This module contains:
//! - The running emotion histogram
//! - The rolling store statistics
//! - Record queries and confidence summaries
//! - CSV/JSON export

pub mod export;
pub mod histogram;
pub mod query;
pub mod stats;

// Re-export commonly used types
pub use export::{to_csv, ExportError, ExportFormat, Exporter, CSV_HEADER, EXPORT_FILE_NAME};
pub use histogram::{
    histogram_from_events, recompute, HistogramBucket, HistogramState, DISPLAY_ORDER,
};
pub use query::{ConfidenceSummary, RecordQuery};
pub use stats::{RollingStatsEstimator, RollingStatsSnapshot};
