//! Merging freshly resolved mentions into a persisted map.
//!
//! The merge is coordinate-keyed: a mention matches an existing place when
//! their rounded coordinates hash to the same id. Matching is idempotent at
//! the place level — running the same mention batch twice never creates a
//! duplicate place and never removes one. User edits survive: a non-empty
//! note is never touched, and a known sentiment is never overridden by a
//! later extraction.

use chrono::Utc;
use tracing::debug;

use crate::model::{Confidence, Place, PlaceMap, ResolvedMention, Sentiment};
use crate::place_id::place_id;
use crate::tag::TagRules;

/// Counters for one extract-and-merge cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Raw mentions produced by the extraction backends.
    pub extracted: usize,
    /// Mentions that geocoded successfully and entered the merge.
    pub resolved: usize,
    /// Places created by this cycle.
    pub merged_new: usize,
    /// Mentions folded into an already-present place.
    pub merged_duplicate: usize,
    /// Mentions dropped because geocoding found nothing.
    pub failed: usize,
}

/// Merge `mentions` into `map`, returning the updated map and counters.
///
/// The input map is not mutated; callers persist the returned value
/// explicitly. Mentions with failed resolution are counted and skipped.
/// For a matched place the context is appended (append-only audit trail,
/// repeats allowed) and sentiment is only filled in when still unknown.
/// New places are tagged via `rules` and appended, preserving first-seen
/// order. `updated_at` is refreshed; `created_at` is untouched.
pub fn reconcile(
    map: &PlaceMap,
    mentions: &[ResolvedMention],
    rules: &TagRules,
) -> (PlaceMap, ReconcileSummary) {
    let mut out = map.clone();
    let mut summary = ReconcileSummary {
        extracted: mentions.len(),
        ..Default::default()
    };

    for mention in mentions {
        if mention.confidence == Confidence::Failed {
            debug!(name = %mention.mention.text, "skipping unresolved mention");
            summary.failed += 1;
            continue;
        }
        summary.resolved += 1;

        let id = place_id(mention.lat, mention.lng);
        match out.places.iter_mut().find(|p| p.id == id) {
            Some(existing) => {
                existing.source_contexts.push(mention.mention.context.clone());
                if existing.sentiment == Sentiment::Unknown {
                    existing.sentiment = mention.mention.sentiment;
                }
                summary.merged_duplicate += 1;
            }
            None => {
                out.places.push(Place {
                    id,
                    name: mention.mention.text.clone(),
                    lat: mention.lat,
                    lng: mention.lng,
                    tag: rules.tag_for(mention),
                    sentiment: mention.mention.sentiment,
                    note: String::new(),
                    source_contexts: vec![mention.mention.context.clone()],
                });
                summary.merged_new += 1;
            }
        }
    }

    out.updated_at = Utc::now();
    (out, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MentionSource, RawMention, Sentiment};

    fn resolved(
        text: &str,
        lat: f64,
        lng: f64,
        sentiment: Sentiment,
        confidence: Confidence,
    ) -> ResolvedMention {
        ResolvedMention {
            mention: RawMention {
                text: text.into(),
                context: format!("...about {text}..."),
                sentiment,
                source: MentionSource::Llm,
            },
            lat,
            lng,
            formatted_address: format!("{text}, somewhere"),
            confidence,
            place_types: Vec::new(),
        }
    }

    fn eiffel(sentiment: Sentiment) -> ResolvedMention {
        resolved("Eiffel Tower", 48.8584, 2.2945, sentiment, Confidence::Exact)
    }

    #[test]
    fn new_place_created_with_tag_and_context() {
        let map = PlaceMap::new("paris");
        let (out, summary) = reconcile(&map, &[eiffel(Sentiment::Positive)], &TagRules::default());

        assert_eq!(out.places.len(), 1);
        let place = &out.places[0];
        assert_eq!(place.name, "Eiffel Tower");
        assert_eq!(place.tag, "landmark");
        assert_eq!(place.sentiment, Sentiment::Positive);
        assert_eq!(place.source_contexts.len(), 1);
        assert!(place.note.is_empty());
        assert_eq!(summary.merged_new, 1);
        assert_eq!(summary.resolved, 1);
    }

    #[test]
    fn failed_resolutions_never_reach_the_map() {
        let map = PlaceMap::new("paris");
        let failed = resolved("Atlantis", 0.0, 0.0, Sentiment::Neutral, Confidence::Failed);
        let (out, summary) = reconcile(&map, &[failed], &TagRules::default());

        assert!(out.places.is_empty());
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.resolved, 0);
    }

    #[test]
    fn empty_mentions_leave_places_unchanged() {
        let (seeded, _) = reconcile(
            &PlaceMap::new("paris"),
            &[eiffel(Sentiment::Positive)],
            &TagRules::default(),
        );
        let (out, summary) = reconcile(&seeded, &[], &TagRules::default());

        assert_eq!(out.places.len(), seeded.places.len());
        assert_eq!(out.places[0].id, seeded.places[0].id);
        assert_eq!(summary, ReconcileSummary::default());
    }

    #[test]
    fn idempotent_no_duplicate_places() {
        let mentions = [eiffel(Sentiment::Positive)];
        let rules = TagRules::default();
        let (once, _) = reconcile(&PlaceMap::new("paris"), &mentions, &rules);
        let (twice, summary) = reconcile(&once, &mentions, &rules);

        assert_eq!(twice.places.len(), 1);
        assert_eq!(summary.merged_duplicate, 1);
        assert_eq!(summary.merged_new, 0);
        // Audit trail grows; that repetition is expected.
        assert_eq!(twice.places[0].source_contexts.len(), 2);
    }

    #[test]
    fn coordinates_within_precision_merge_to_one_place() {
        let a = resolved("Eiffel Tower", 48.858401, 2.294502, Sentiment::Unknown, Confidence::Exact);
        let b = resolved("Tour Eiffel", 48.858399, 2.294498, Sentiment::Unknown, Confidence::Approximate);
        let (out, summary) = reconcile(&PlaceMap::new("paris"), &[a, b], &TagRules::default());

        assert_eq!(out.places.len(), 1);
        assert_eq!(summary.merged_new, 1);
        assert_eq!(summary.merged_duplicate, 1);
        // First-seen name is the canonical one.
        assert_eq!(out.places[0].name, "Eiffel Tower");
    }

    #[test]
    fn known_sentiment_sticks() {
        let rules = TagRules::default();
        let (map, _) = reconcile(&PlaceMap::new("paris"), &[eiffel(Sentiment::Positive)], &rules);
        let (out, _) = reconcile(&map, &[eiffel(Sentiment::Negative)], &rules);

        assert_eq!(out.places[0].sentiment, Sentiment::Positive);
    }

    #[test]
    fn unknown_sentiment_filled_by_later_mention() {
        let rules = TagRules::default();
        let (map, _) = reconcile(&PlaceMap::new("paris"), &[eiffel(Sentiment::Unknown)], &rules);
        assert_eq!(map.places[0].sentiment, Sentiment::Unknown);

        let (out, _) = reconcile(&map, &[eiffel(Sentiment::Negative)], &rules);
        assert_eq!(out.places[0].sentiment, Sentiment::Negative);
    }

    #[test]
    fn user_note_survives_reconciliation() {
        let rules = TagRules::default();
        let (mut map, _) = reconcile(&PlaceMap::new("paris"), &[eiffel(Sentiment::Positive)], &rules);
        map.places[0].note = "book tickets in advance".into();

        let (out, _) = reconcile(&map, &[eiffel(Sentiment::Neutral)], &rules);
        assert_eq!(out.places[0].note, "book tickets in advance");
    }

    #[test]
    fn repeat_with_neutral_keeps_positive_and_appends_context() {
        let rules = TagRules::default();
        let (map, _) = reconcile(&PlaceMap::new("paris"), &[eiffel(Sentiment::Positive)], &rules);
        let (out, _) = reconcile(&map, &[eiffel(Sentiment::Neutral)], &rules);

        assert_eq!(out.places.len(), 1);
        assert_eq!(out.places[0].sentiment, Sentiment::Positive);
        assert_eq!(out.places[0].source_contexts.len(), 2);
    }

    #[test]
    fn failure_counter_increments_and_places_unchanged() {
        let rules = TagRules::default();
        let (map, _) = reconcile(&PlaceMap::new("paris"), &[eiffel(Sentiment::Positive)], &rules);

        let failed = resolved("Nowhere", 0.0, 0.0, Sentiment::Unknown, Confidence::Failed);
        let (out, summary) = reconcile(&map, &[failed], &rules);

        assert_eq!(summary.failed, 1);
        assert_eq!(out.places.len(), map.places.len());
    }

    #[test]
    fn created_at_unchanged_updated_at_refreshed() {
        let map = PlaceMap::new("paris");
        let created = map.created_at;
        let (out, _) = reconcile(&map, &[eiffel(Sentiment::Positive)], &TagRules::default());

        assert_eq!(out.created_at, created);
        assert!(out.updated_at >= map.updated_at);
    }

    #[test]
    fn insertion_order_is_first_seen_order() {
        let a = resolved("Eiffel Tower", 48.8584, 2.2945, Sentiment::Unknown, Confidence::Exact);
        let b = resolved("Louvre", 48.8606, 2.3376, Sentiment::Unknown, Confidence::Exact);
        let c = resolved("Notre-Dame", 48.8530, 2.3499, Sentiment::Unknown, Confidence::Exact);
        let (out, _) = reconcile(&PlaceMap::new("paris"), &[a, b, c], &TagRules::default());

        let names: Vec<&str> = out.places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Eiffel Tower", "Louvre", "Notre-Dame"]);
    }
}
