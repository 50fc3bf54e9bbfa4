//! Record lookup over store snapshots.
//!
//! Mirrors the dashboard's records table: free-text search over the
//! expression and location labels, an optional expression filter, and a
//! confidence floor a calling layer may apply from its configuration.

use crate::events::{Category, DetectionEvent};
use serde::Serialize;
use statrs::statistics::{Data, Distribution};

/// Filter applied to a snapshot.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    /// Case-insensitive substring matched against expression or location
    pub search: Option<String>,
    /// Keep only this expression
    pub category: Option<Category>,
    /// Keep only events at or above this confidence
    pub min_confidence: Option<u8>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() { None } else { Some(term) };
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn min_confidence(mut self, confidence: u8) -> Self {
        self.min_confidence = Some(confidence);
        self
    }

    pub fn matches(&self, event: &DetectionEvent) -> bool {
        if let Some(ref term) = self.search {
            let term = term.to_lowercase();
            let in_category = event.category().label().to_lowercase().contains(&term);
            let in_location = event.location().label().to_lowercase().contains(&term);
            if !in_category && !in_location {
                return false;
            }
        }

        if let Some(category) = self.category {
            if event.category() != category {
                return false;
            }
        }

        match self.min_confidence {
            Some(floor) => event.confidence() >= floor,
            None => true,
        }
    }

    /// Matching events, in snapshot order.
    pub fn apply(&self, events: &[DetectionEvent]) -> Vec<DetectionEvent> {
        events.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}

/// Summary of the confidence values in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: u8,
    pub max: u8,
}

impl ConfidenceSummary {
    /// Summarize a snapshot; `None` when it is empty.
    pub fn from_events(events: &[DetectionEvent]) -> Option<Self> {
        if events.is_empty() {
            return None;
        }

        let values: Vec<f64> = events.iter().map(|e| e.confidence() as f64).collect();
        let data = Data::new(values);

        let mean = data.mean().unwrap_or(0.0);
        let std_dev = data.std_dev().filter(|v| v.is_finite()).unwrap_or(0.0);

        Some(Self {
            count: events.len(),
            mean,
            std_dev,
            min: events.iter().map(|e| e.confidence()).min().unwrap_or(0),
            max: events.iter().map(|e| e.confidence()).max().unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MediaKind, Zone};

    fn sample() -> Vec<DetectionEvent> {
        vec![
            DetectionEvent::live(Category::Happy, Zone::EntryDoor, 85).unwrap(),
            DetectionEvent::live(Category::Neutral, Zone::CheckoutArea, 72).unwrap(),
            DetectionEvent::live(Category::Surprised, Zone::ExitDoor, 68).unwrap(),
            DetectionEvent::live(Category::Happy, Zone::EntryDoor, 91).unwrap(),
            DetectionEvent::upload(Category::Sad, MediaKind::Image, 76).unwrap(),
        ]
    }

    #[test]
    fn test_empty_query_matches_all() {
        assert_eq!(RecordQuery::new().apply(&sample()).len(), 5);
    }

    #[test]
    fn test_search_by_location_and_category() {
        let events = sample();
        assert_eq!(RecordQuery::new().search("entry").apply(&events).len(), 2);
        assert_eq!(RecordQuery::new().search("HAPPY").apply(&events).len(), 2);
        assert_eq!(RecordQuery::new().search("upload").apply(&events).len(), 1);
        assert!(RecordQuery::new().search("parking").apply(&events).is_empty());
    }

    #[test]
    fn test_blank_search_is_ignored() {
        assert!(RecordQuery::new().search("   ").search.is_none());
    }

    #[test]
    fn test_category_and_confidence_filters() {
        let events = sample();
        let happy = RecordQuery::new().category(Category::Happy).apply(&events);
        assert_eq!(happy.len(), 2);

        let confident = RecordQuery::new()
            .category(Category::Happy)
            .min_confidence(90)
            .apply(&events);
        assert_eq!(confident.len(), 1);
        assert_eq!(confident[0].confidence(), 91);
    }

    #[test]
    fn test_confidence_summary() {
        assert!(ConfidenceSummary::from_events(&[]).is_none());

        let summary = ConfidenceSummary::from_events(&sample()).unwrap();
        assert_eq!(summary.count, 5);
        assert!((summary.mean - 78.4).abs() < 1e-9);
        assert_eq!(summary.min, 68);
        assert_eq!(summary.max, 91);
        assert!(summary.std_dev > 0.0);
    }

    #[test]
    fn test_single_event_summary_has_zero_spread() {
        let events = vec![DetectionEvent::live(Category::Fear, Zone::ExitDoor, 80).unwrap()];
        let summary = ConfidenceSummary::from_events(&events).unwrap();
        assert_eq!(summary.mean, 80.0);
        assert_eq!(summary.std_dev, 0.0);
    }
}
