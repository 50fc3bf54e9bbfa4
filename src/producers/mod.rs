//! Event producers and the timers that drive them.
//!
//! Neither producer reads a real sensor: the live simulator synthesizes
//! camera detections and the upload stub fakes classification of
//! user-submitted media.

pub mod scheduler;
pub mod simulator;
pub mod upload;

// Re-export commonly used types
pub use scheduler::{PeriodicTask, Schedule, TaskSlot};
pub use simulator::{synthesize_detection, LiveSimulator, SimulatorState};
pub use upload::{media_kind_for, MediaItem, UploadClassifier, UploadError};
