//! Shared data model: mentions flowing through the pipeline and the persisted map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a place was described in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    /// No signal in the text yet. The first non-unknown sentiment to arrive
    /// sticks; later extractions never override it.
    #[default]
    Unknown,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Unknown => "unknown",
        }
    }
}

/// Which extraction backend produced a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionSource {
    Ner,
    Llm,
}

/// Outcome of geocoding a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// The geocoder returned exactly one match.
    Exact,
    /// Multiple matches; the top-ranked one was taken.
    Approximate,
    /// No match. Carries sentinel coordinates and is dropped before merging.
    Failed,
}

/// A place name found in source text, before coordinate resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMention {
    /// The place name as it appears in the text.
    pub text: String,
    /// Minimal span (sentence or backend-provided snippet) containing the
    /// mention. Empty if the backend provides none.
    pub context: String,
    pub sentiment: Sentiment,
    pub source: MentionSource,
}

/// A mention with coordinates attached by the geocoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedMention {
    pub mention: RawMention,
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
    pub confidence: Confidence,
    /// Place-type hints from the geocoder (e.g. "museum", "train_station"),
    /// consumed by the tagger.
    #[serde(default)]
    pub place_types: Vec<String>,
}

impl ResolvedMention {
    /// A resolution that found nothing. Sentinel coordinates, never merged.
    pub fn failed(mention: RawMention) -> Self {
        Self {
            mention,
            lat: 0.0,
            lng: 0.0,
            formatted_address: String::new(),
            confidence: Confidence::Failed,
            place_types: Vec::new(),
        }
    }
}

/// A persisted place record on a map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    /// Stable identifier derived from rounded coordinates, never from the
    /// name string. See [`crate::place_id`].
    pub id: String,
    /// Canonical display name (first name the place was extracted under).
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Always a member of [`crate::tag::TAXONOMY`].
    pub tag: String,
    pub sentiment: Sentiment,
    /// User-editable; empty until the user writes one, then preserved across
    /// every reconciliation.
    #[serde(default)]
    pub note: String,
    /// Append-only audit trail of extraction contexts that produced or
    /// reinforced this place.
    #[serde(default)]
    pub source_contexts: Vec<String>,
}

/// A named, persisted collection of places. Insertion order is first-seen order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceMap {
    pub name: String,
    pub places: Vec<Place>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlaceMap {
    /// An empty map created now.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            places: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a place by its stable id.
    pub fn find(&self, id: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.id == id)
    }

    /// First id that appears more than once, if any. A well-formed map has none.
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        for place in &self.places {
            if !seen.insert(place.id.as_str()) {
                return Some(&place.id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sentiment::Positive).unwrap(), "\"positive\"");
        assert_eq!(serde_json::to_string(&Sentiment::Unknown).unwrap(), "\"unknown\"");
    }

    #[test]
    fn place_json_roundtrip() {
        let place = Place {
            id: "ab12cd34ef56ab78".into(),
            name: "Eiffel Tower".into(),
            lat: 48.8584,
            lng: 2.2945,
            tag: "landmark".into(),
            sentiment: Sentiment::Positive,
            note: String::new(),
            source_contexts: vec!["We loved the Eiffel Tower.".into()],
        };
        let json = serde_json::to_string(&place).unwrap();
        let parsed: Place = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, place.id);
        assert_eq!(parsed.sentiment, Sentiment::Positive);
        assert_eq!(parsed.source_contexts.len(), 1);
    }

    #[test]
    fn place_missing_note_defaults_empty() {
        let json = r#"{
            "id": "ab12cd34ef56ab78",
            "name": "Eiffel Tower",
            "lat": 48.8584,
            "lng": 2.2945,
            "tag": "landmark",
            "sentiment": "neutral"
        }"#;
        let parsed: Place = serde_json::from_str(json).unwrap();
        assert!(parsed.note.is_empty());
        assert!(parsed.source_contexts.is_empty());
    }

    #[test]
    fn new_map_is_empty_with_equal_timestamps() {
        let map = PlaceMap::new("trip");
        assert!(map.places.is_empty());
        assert_eq!(map.created_at, map.updated_at);
    }

    #[test]
    fn duplicate_id_detects_repeats() {
        let mut map = PlaceMap::new("trip");
        let place = Place {
            id: "same".into(),
            name: "A".into(),
            lat: 0.0,
            lng: 0.0,
            tag: "other".into(),
            sentiment: Sentiment::Unknown,
            note: String::new(),
            source_contexts: Vec::new(),
        };
        map.places.push(place.clone());
        assert!(map.duplicate_id().is_none());
        map.places.push(place);
        assert_eq!(map.duplicate_id(), Some("same"));
    }
}
