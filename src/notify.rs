//! Discrete notifications for the surrounding layer.
//!
//! Producers push messages; the consumer drains them from the receiver.
//! Nothing here is polled state.

use crate::events::{Category, DetectionEvent, MediaKind};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    RecordingStarted,
    RecordingStopped,
    LatestDetection {
        event: DetectionEvent,
    },
    ClassificationSucceeded {
        category: Category,
        confidence: u8,
        media_kind: MediaKind,
    },
    UnsupportedFileRejected {
        name: String,
        mime: String,
    },
    DataExported {
        rows: usize,
    },
}

impl Notification {
    /// One-line human readable message.
    pub fn message(&self) -> String {
        match self {
            Notification::RecordingStarted => {
                "Detection started: real-time emotion analysis active".to_string()
            }
            Notification::RecordingStopped => {
                "Detection stopped: facial expression monitoring paused".to_string()
            }
            Notification::LatestDetection { event } => format!(
                "[{}] {} at {} ({}% confidence)",
                event.timestamp().format("%H:%M:%S"),
                event.category(),
                event.location(),
                event.confidence()
            ),
            Notification::ClassificationSucceeded {
                category,
                confidence,
                media_kind,
            } => format!("Emotion detected in {media_kind}: {category} ({confidence}% confidence)"),
            Notification::UnsupportedFileRejected { name, mime } => {
                format!("Unsupported file {name} ({mime}): select an image or MP4 video")
            }
            Notification::DataExported { rows } => format!("Data exported: {rows} records"),
        }
    }
}

/// Sending half handed to producers.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: Sender<Notification>,
}

impl Notifier {
    /// Send a notification. Dropped silently when nobody is listening.
    pub fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            tracing::trace!("Notification dropped: receiver gone");
        }
    }
}

/// Create a notifier and its receiver.
pub fn channel() -> (Notifier, Receiver<Notification>) {
    let (sender, receiver) = unbounded();
    (Notifier { sender }, receiver)
}
