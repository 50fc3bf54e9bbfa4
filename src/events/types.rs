//! Detection event types shared by every producer and view.
//!
//! Events are validated once at construction and are immutable afterwards.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Highest confidence percentage an event may carry.
pub const MAX_CONFIDENCE: u8 = 100;

/// Emotion label reported by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Happy,
    Sad,
    Sadness,
    Angry,
    Surprised,
    Fear,
    Disgust,
    Neutral,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 8] = [
        Category::Happy,
        Category::Sad,
        Category::Sadness,
        Category::Angry,
        Category::Surprised,
        Category::Fear,
        Category::Disgust,
        Category::Neutral,
    ];

    /// Categories the upload classifier reports.
    pub const UPLOAD: [Category; 5] = [
        Category::Happy,
        Category::Neutral,
        Category::Surprised,
        Category::Sad,
        Category::Angry,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Happy => "Happy",
            Category::Sad => "Sad",
            Category::Sadness => "Sadness",
            Category::Angry => "Angry",
            Category::Surprised => "Surprised",
            Category::Fear => "Fear",
            Category::Disgust => "Disgust",
            Category::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

/// Physical or logical location an event is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Zone {
    EntryDoor,
    ExitDoor,
    CheckoutArea,
    PhotoUpload,
    VideoUpload,
}

impl Zone {
    pub const ALL: [Zone; 5] = [
        Zone::EntryDoor,
        Zone::ExitDoor,
        Zone::CheckoutArea,
        Zone::PhotoUpload,
        Zone::VideoUpload,
    ];

    /// Zones covered by the in-store cameras.
    pub fn in_store() -> &'static [Zone] {
        &Zone::ALL[..3]
    }

    /// Whether this zone only exists for uploaded media.
    pub fn is_upload(&self) -> bool {
        matches!(self, Zone::PhotoUpload | Zone::VideoUpload)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Zone::EntryDoor => "Entry Door",
            Zone::ExitDoor => "Exit Door",
            Zone::CheckoutArea => "Checkout Area",
            Zone::PhotoUpload => "Photo Upload",
            Zone::VideoUpload => "Video Upload",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Zone {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Zone::ALL
            .iter()
            .copied()
            .find(|z| {
                let label: String = z.label().chars().filter(|c| !c.is_whitespace()).collect();
                label.eq_ignore_ascii_case(&wanted)
            })
            .ok_or_else(|| ValidationError::UnknownZone(s.to_string()))
    }
}

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Live,
    Upload,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Live => f.write_str("live"),
            Source::Upload => f.write_str("upload"),
        }
    }
}

/// Kind of uploaded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// The zone upload events of this kind are recorded under.
    pub fn zone(&self) -> Zone {
        match self {
            MediaKind::Image => Zone::PhotoUpload,
            MediaKind::Video => Zone::VideoUpload,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// One classified expression observation.
///
/// Fields are private so that every instance has passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionEvent {
    id: Uuid,
    timestamp: DateTime<Utc>,
    category: Category,
    location: Zone,
    confidence: u8,
    source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_kind: Option<MediaKind>,
}

impl DetectionEvent {
    /// Build and validate an event stamped with the current time.
    pub fn new(
        category: Category,
        location: Zone,
        confidence: u8,
        source: Source,
        media_kind: Option<MediaKind>,
    ) -> Result<Self, ValidationError> {
        if confidence > MAX_CONFIDENCE {
            return Err(ValidationError::ConfidenceOutOfRange(i64::from(confidence)));
        }

        match (source, media_kind) {
            (Source::Live, Some(kind)) => {
                return Err(ValidationError::MediaKindMismatch { source, kind: Some(kind) })
            }
            (Source::Upload, None) => {
                return Err(ValidationError::MediaKindMismatch { source, kind: None })
            }
            _ => {}
        }

        if location.is_upload() != (source == Source::Upload) {
            return Err(ValidationError::ZoneMismatch { source, location });
        }
        if let Some(kind) = media_kind {
            if location != kind.zone() {
                return Err(ValidationError::ZoneMismatch { source, location });
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            category,
            location,
            confidence,
            source,
            media_kind,
        })
    }

    /// A live camera detection.
    pub fn live(category: Category, location: Zone, confidence: u8) -> Result<Self, ValidationError> {
        Self::new(category, location, confidence, Source::Live, None)
    }

    /// A detection produced by classifying uploaded media.
    pub fn upload(
        category: Category,
        kind: MediaKind,
        confidence: u8,
    ) -> Result<Self, ValidationError> {
        Self::new(category, kind.zone(), confidence, Source::Upload, Some(kind))
    }

    /// Parse an event from display labels, as typed by an operator.
    pub fn from_labels(
        category: &str,
        location: &str,
        confidence: i64,
    ) -> Result<Self, ValidationError> {
        let category = category.parse::<Category>()?;
        let location = location.parse::<Zone>()?;
        let confidence = u8::try_from(confidence)
            .map_err(|_| ValidationError::ConfidenceOutOfRange(confidence))?;
        Self::live(category, location, confidence)
    }

    /// Replace the timestamp (for replaying recorded sessions).
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn location(&self) -> Zone {
        self.location
    }

    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        self.media_kind
    }
}

/// Malformed event fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    ConfidenceOutOfRange(i64),
    UnknownCategory(String),
    UnknownZone(String),
    MediaKindMismatch {
        source: Source,
        kind: Option<MediaKind>,
    },
    ZoneMismatch {
        source: Source,
        location: Zone,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ConfidenceOutOfRange(c) => {
                write!(f, "Confidence {c} is outside 0..={MAX_CONFIDENCE}")
            }
            ValidationError::UnknownCategory(s) => write!(f, "Unknown category: {s:?}"),
            ValidationError::UnknownZone(s) => write!(f, "Unknown zone: {s:?}"),
            ValidationError::MediaKindMismatch { source, kind: Some(kind) } => {
                write!(f, "A {source} event cannot carry media kind {kind}")
            }
            ValidationError::MediaKindMismatch { source, kind: None } => {
                write!(f, "An {source} event requires a media kind")
            }
            ValidationError::ZoneMismatch { source, location } => {
                write!(f, "Zone {location} is not valid for a {source} event")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
