//! Fixed category taxonomy and the ordered keyword rules that assign tags.
//!
//! A tag comes from matching geocoder place-type hints first, then the
//! mention's name and context, against an ordered rule table. First matching
//! rule wins; no match falls back to [`FALLBACK_TAG`]. Tagging is
//! deterministic: same input, same tag, no external calls.

use crate::model::ResolvedMention;

/// Every tag a place can carry.
pub const TAXONOMY: &[&str] = &[
    "landmark",
    "attraction",
    "viewpoint",
    "cultural",
    "natural",
    "restaurant",
    "cafe",
    "bar",
    "nightlife",
    "snacks",
    "groceries",
    "lodging",
    "shopping",
    "concert",
    "transit",
    "other",
];

/// Assigned when no rule matches.
pub const FALLBACK_TAG: &str = "other";

/// One rule: any keyword appearing in the signal text assigns `tag`.
#[derive(Debug, Clone)]
pub struct TagRule {
    pub tag: &'static str,
    pub keywords: &'static [&'static str],
}

/// Ordered rule table, evaluated top-to-bottom.
///
/// The default table covers the full taxonomy; callers can construct a
/// custom table for testing or alternative classification schemes.
#[derive(Debug, Clone)]
pub struct TagRules {
    rules: Vec<TagRule>,
}

impl Default for TagRules {
    fn default() -> Self {
        Self {
            rules: vec![
                TagRule {
                    tag: "lodging",
                    keywords: &["hotel", "hostel", "lodging", "accommodation", "resort", "guesthouse", "inn"],
                },
                TagRule {
                    tag: "cafe",
                    keywords: &["cafe", "coffee", "bakery", "tearoom"],
                },
                TagRule {
                    tag: "bar",
                    keywords: &["bar", "pub", "brewery", "taproom"],
                },
                TagRule {
                    tag: "nightlife",
                    keywords: &["nightclub", "night_club", "nightlife", "disco"],
                },
                TagRule {
                    tag: "restaurant",
                    keywords: &["restaurant", "steakhouse", "bistro", "diner", "eatery", "brasserie", "trattoria", "food"],
                },
                TagRule {
                    tag: "snacks",
                    keywords: &["snack", "street food", "food stall", "takeaway"],
                },
                TagRule {
                    tag: "groceries",
                    keywords: &["grocery", "supermarket", "greengrocer", "deli"],
                },
                TagRule {
                    tag: "transit",
                    keywords: &["station", "airport", "terminal", "ferry", "railway", "metro", "subway", "transit", "bus_station", "train_station", "harbour", "harbor", "port"],
                },
                TagRule {
                    tag: "viewpoint",
                    keywords: &["viewpoint", "overlook", "lookout", "observation", "summit"],
                },
                TagRule {
                    tag: "concert",
                    keywords: &["concert", "arena", "stadium", "amphitheatre", "amphitheater", "music venue"],
                },
                TagRule {
                    tag: "cultural",
                    keywords: &["museum", "gallery", "theatre", "theater", "opera", "library", "cathedral", "church", "temple", "shrine", "mosque", "synagogue", "palace"],
                },
                TagRule {
                    tag: "natural",
                    keywords: &["park", "garden", "beach", "mountain", "lake", "river", "forest", "trail", "waterfall", "natural_feature", "island"],
                },
                TagRule {
                    tag: "shopping",
                    keywords: &["shop", "mall", "market", "boutique", "bazaar", "shopping_mall", "store"],
                },
                TagRule {
                    tag: "attraction",
                    keywords: &["attraction", "tourist_attraction", "zoo", "aquarium", "theme park", "amusement"],
                },
                TagRule {
                    tag: "landmark",
                    keywords: &["landmark", "monument", "tower", "bridge", "castle", "fort", "statue", "square", "plaza", "historic", "point_of_interest"],
                },
            ],
        }
    }
}

impl TagRules {
    /// Build a table from an explicit rule list. Order is significant.
    pub fn new(rules: Vec<TagRule>) -> Self {
        Self { rules }
    }

    /// Assign a tag to a resolved mention.
    ///
    /// Geocoder place-type hints are the strongest signal and are checked
    /// first; the mention's name and surrounding context come second.
    pub fn tag_for(&self, mention: &ResolvedMention) -> String {
        if !mention.place_types.is_empty() {
            let hints = mention.place_types.join(" ").to_lowercase();
            if let Some(tag) = self.first_match(&hints) {
                return tag.to_string();
            }
        }

        let text = format!("{} {}", mention.mention.text, mention.mention.context).to_lowercase();
        if let Some(tag) = self.first_match(&text) {
            return tag.to_string();
        }

        FALLBACK_TAG.to_string()
    }

    fn first_match(&self, haystack: &str) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| haystack.contains(kw)))
            .map(|rule| rule.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Confidence, MentionSource, RawMention, Sentiment};

    fn mention(text: &str, context: &str, place_types: &[&str]) -> ResolvedMention {
        ResolvedMention {
            mention: RawMention {
                text: text.into(),
                context: context.into(),
                sentiment: Sentiment::Unknown,
                source: MentionSource::Ner,
            },
            lat: 0.0,
            lng: 0.0,
            formatted_address: String::new(),
            confidence: Confidence::Exact,
            place_types: place_types.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn every_rule_tag_is_in_taxonomy() {
        let rules = TagRules::default();
        for rule in &rules.rules {
            assert!(TAXONOMY.contains(&rule.tag), "unknown tag {}", rule.tag);
        }
    }

    #[test]
    fn place_type_hint_wins_over_context() {
        // Context says "dinner" but the geocoder calls it a museum.
        let m = mention("Louvre", "We had dinner near the Louvre.", &["museum"]);
        assert_eq!(TagRules::default().tag_for(&m), "cultural");
    }

    #[test]
    fn name_keyword_matches() {
        let m = mention("Eiffel Tower", "We visited the Eiffel Tower.", &[]);
        assert_eq!(TagRules::default().tag_for(&m), "landmark");
    }

    #[test]
    fn context_keyword_matches() {
        let m = mention("Peter Luger", "Dinner at the famous steakhouse Peter Luger.", &[]);
        assert_eq!(TagRules::default().tag_for(&m), "restaurant");
    }

    #[test]
    fn geocoder_type_codes_match() {
        let m = mention("Gare du Nord", "", &["train_station", "point_of_interest"]);
        assert_eq!(TagRules::default().tag_for(&m), "transit");
    }

    #[test]
    fn no_match_falls_back_to_other() {
        let m = mention("Springfield", "Then we drove through Springfield.", &[]);
        assert_eq!(TagRules::default().tag_for(&m), FALLBACK_TAG);
    }

    #[test]
    fn first_rule_wins() {
        // "hotel bar" matches lodging before bar because lodging is ordered first.
        let m = mention("Raffles", "Drinks at the hotel bar of Raffles.", &[]);
        assert_eq!(TagRules::default().tag_for(&m), "lodging");
    }

    #[test]
    fn deterministic() {
        let m = mention("Central Park", "A walk in Central Park.", &["park"]);
        let rules = TagRules::default();
        assert_eq!(rules.tag_for(&m), rules.tag_for(&m));
    }
}
