//! Retail Emotion Agent - event ingestion and rolling aggregation core.
//!
//! This library backs a retail "customer emotion" dashboard. It accepts
//! detection events from a simulated live camera and from an upload
//! classification stub, keeps a bounded history, and maintains the views
//! the dashboard displays.
//!
//! # Simulated Data
//!
//! - **No camera input**: live detections are drawn at random on a jittered timer
//! - **No inference**: uploaded media is never inspected, only its MIME type
//! - **No event persistence**: the history lives only as long as the session
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Dashboard Session                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐                       ┌─────────────┐       │
//! │  │    Live     │──┐                ┌──▶│  Exporter   │       │
//! │  │  Simulator  │  │  ┌───────────┐ │   │  (CSV/JSON) │       │
//! │  └─────────────┘  ├─▶│  Bounded  │─┤   └─────────────┘       │
//! │  ┌─────────────┐  │  │   Store   │ │   ┌─────────────┐       │
//! │  │   Upload    │──┘  │  (FIFO)   │ └──▶│   Query     │       │
//! │  │    Stub     │     └───────────┘     └─────────────┘       │
//! │  └─────────────┘                                             │
//! │  ┌─────────────┐     ┌─────────────┐   (own timers, not      │
//! │  │  Histogram  │     │Rolling Stats│    derived from store)  │
//! │  └─────────────┘     └─────────────┘                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use retail_emotion_agent::{Config, DashboardSession};
//!
//! # async fn demo() {
//! let (session, notifications) = DashboardSession::new(Config::default())
//!     .expect("valid configuration");
//!
//! session.start_recording();
//! tokio::time::sleep(std::time::Duration::from_secs(10)).await;
//! session.stop_recording();
//!
//! for note in notifications.try_iter() {
//!     println!("{}", note.message());
//! }
//! println!("{}", session.export_csv());
//! # }
//! ```

pub mod config;
pub mod core;
pub mod events;
pub mod notify;
pub mod producers;
pub mod session;
pub mod transparency;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{
    to_csv, ExportFormat, Exporter, HistogramBucket, HistogramState, RecordQuery,
    RollingStatsEstimator, RollingStatsSnapshot,
};
pub use events::{
    Category, DetectionEvent, EventStore, MediaKind, SharedEventStore, Source, ValidationError,
    Zone,
};
pub use notify::{Notification, Notifier};
pub use producers::{LiveSimulator, MediaItem, UploadClassifier, UploadError};
pub use session::DashboardSession;
pub use transparency::{SessionLog, SessionStats, SharedSessionLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice displayed to operators.
pub const SIMULATION_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║           RETAIL EMOTION AGENT - SIMULATION NOTICE               ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Every figure this agent reports is SIMULATED.                   ║
║                                                                  ║
║  ✓ WHAT IT DOES:                                                 ║
║    • Synthesizes live detections every 2-5 seconds               ║
║    • Fakes classification of uploaded images and MP4 videos      ║
║    • Keeps the last 100 detections for display and export        ║
║                                                                  ║
║  ✗ WHAT IT NEVER DOES:                                           ║
║    • Read a camera or decode video                               ║
║    • Run a face or emotion model                                 ║
║    • Look inside uploaded files                                  ║
║    • Keep detections after the session ends                      ║
║                                                                  ║
║  Export the current history anytime with:                        ║
║    retail-emotion run --duration 60                              ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
