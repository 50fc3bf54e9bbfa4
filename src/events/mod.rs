//! Detection events and the bounded history they are kept in.

pub mod store;
pub mod types;

// Re-export commonly used types
pub use store::{create_shared_store, EventStore, SharedEventStore, DEFAULT_CAPACITY};
pub use types::{Category, DetectionEvent, MediaKind, Source, ValidationError, Zone};
