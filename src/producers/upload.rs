//! Upload classification stub.
//!
//! There is no model behind this: a submitted image or MP4 is "analyzed"
//! by waiting a fixed processing time and drawing a random expression.

use crate::events::{Category, DetectionEvent, MediaKind, SharedEventStore, ValidationError};
use crate::notify::{Notification, Notifier};
use crate::producers::scheduler::lock;
use crate::producers::simulator::synthetic_confidence;
use crate::transparency::SharedSessionLog;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Default simulated processing time for images.
pub const DEFAULT_IMAGE_DELAY: Duration = Duration::from_secs(2);
/// Default simulated processing time for videos.
pub const DEFAULT_VIDEO_DELAY: Duration = Duration::from_secs(4);

/// A user-submitted media item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    id: Uuid,
    name: String,
    mime: String,
    size_bytes: u64,
}

impl MediaItem {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            mime: mime.into(),
            size_bytes,
        }
    }

    /// Describe a file on disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, std::io::Error> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, mime_from_path(path), metadata.len()))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Media kind for an accepted MIME type.
    pub fn kind(&self) -> Option<MediaKind> {
        media_kind_for(&self.mime)
    }
}

/// Accepts `image/*` and exactly `video/mp4`.
pub fn media_kind_for(mime: &str) -> Option<MediaKind> {
    let mime = mime.trim().to_ascii_lowercase();
    match mime.strip_prefix("image/") {
        Some(subtype) if !subtype.is_empty() => Some(MediaKind::Image),
        _ if mime == "video/mp4" => Some(MediaKind::Video),
        _ => None,
    }
}

/// Best-effort MIME type from a file extension.
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "txt" => "text/plain",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

/// Errors returned by [`UploadClassifier::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// MIME type outside `image/*` and `video/mp4`
    UnsupportedMedia { name: String, mime: String },
    /// The item was already submitted for classification
    AlreadyClassified(Uuid),
    /// The synthesized result failed validation
    Invalid(ValidationError),
    /// The runtime shut down before the classification finished
    Interrupted(String),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::UnsupportedMedia { name, mime } => {
                write!(f, "Unsupported media type {mime} for {name}: expected image/* or video/mp4")
            }
            UploadError::AlreadyClassified(id) => write!(f, "Media {id} was already classified"),
            UploadError::Invalid(e) => write!(f, "Invalid classification result: {e}"),
            UploadError::Interrupted(e) => write!(f, "Classification interrupted: {e}"),
        }
    }
}

impl std::error::Error for UploadError {}

impl From<ValidationError> for UploadError {
    fn from(e: ValidationError) -> Self {
        UploadError::Invalid(e)
    }
}

/// On-demand classifier for uploaded media.
pub struct UploadClassifier {
    store: SharedEventStore,
    notifier: Notifier,
    log: SharedSessionLog,
    image_delay: Duration,
    video_delay: Duration,
    rng: Arc<Mutex<StdRng>>,
    submitted: Mutex<HashSet<Uuid>>,
}

impl UploadClassifier {
    pub fn new(
        store: SharedEventStore,
        notifier: Notifier,
        log: SharedSessionLog,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            notifier,
            log,
            image_delay: DEFAULT_IMAGE_DELAY,
            video_delay: DEFAULT_VIDEO_DELAY,
            rng: Arc::new(Mutex::new(rng)),
            submitted: Mutex::new(HashSet::new()),
        }
    }

    /// Override the simulated processing times.
    pub fn with_delays(mut self, image: Duration, video: Duration) -> Self {
        self.image_delay = image;
        self.video_delay = video;
        self
    }

    /// Processing time for a media kind.
    pub fn delay_for(&self, kind: MediaKind) -> Duration {
        match kind {
            MediaKind::Image => self.image_delay,
            MediaKind::Video => self.video_delay,
        }
    }

    /// Whether `media` has already been submitted.
    pub fn is_classified(&self, media: &MediaItem) -> bool {
        lock(&self.submitted).contains(&media.id())
    }

    /// Classify one media item and record the result in the store.
    ///
    /// Unsupported types are rejected before any delay. Once accepted, the
    /// work runs on its own task: dropping the returned future does not
    /// cancel it, and the event still lands after the delay.
    pub async fn classify(&self, media: &MediaItem) -> Result<DetectionEvent, UploadError> {
        let Some(kind) = media.kind() else {
            tracing::warn!(name = media.name(), mime = media.mime(), "Rejected upload");
            self.log.record_upload_rejected();
            self.notifier.notify(Notification::UnsupportedFileRejected {
                name: media.name().to_string(),
                mime: media.mime().to_string(),
            });
            return Err(UploadError::UnsupportedMedia {
                name: media.name().to_string(),
                mime: media.mime().to_string(),
            });
        };

        if !lock(&self.submitted).insert(media.id()) {
            return Err(UploadError::AlreadyClassified(media.id()));
        }

        let delay = self.delay_for(kind);
        tracing::debug!(name = media.name(), %kind, ?delay, "Classifying upload");

        let store = self.store.clone();
        let notifier = self.notifier.clone();
        let log = self.log.clone();
        let rng = self.rng.clone();
        let name = media.name().to_string();

        let job = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let event = {
                let mut rng = lock(&*rng);
                let category = *Category::UPLOAD
                    .choose(&mut *rng)
                    .unwrap_or(&Category::Neutral);
                DetectionEvent::upload(category, kind, synthetic_confidence(&mut *rng))?
            };

            if store.push(event.clone()).is_some() {
                log.record_eviction();
            }
            log.record_upload_classified();
            notifier.notify(Notification::ClassificationSucceeded {
                category: event.category(),
                confidence: event.confidence(),
                media_kind: kind,
            });
            tracing::info!(
                name = %name,
                category = %event.category(),
                confidence = event.confidence(),
                "Upload classified"
            );

            Ok::<_, UploadError>(event)
        });

        match job.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(UploadError::Interrupted(e.to_string())),
        }
    }
}
