//! Offline rule-based extraction.
//!
//! Approximates named-entity recognition without a model: candidate spans
//! are runs of capitalised words (with "of"/"the"-style connectors), kept
//! when a locative cue precedes them, a place word appears inside them, or
//! the span is a multi-word proper name. Sentiment comes from a small cue
//! lexicon applied to the containing sentence.

use async_trait::async_trait;
use storymap_core::{MentionSource, RawMention, Sentiment};
use tracing::debug;

use crate::{ExtractionError, Extractor};

/// Words that may join two capitalised words inside one span.
const CONNECTORS: &[&str] = &["of", "the", "de", "la", "du", "des"];

/// Capitalised words that are sentence furniture, not places.
const STOPWORDS: &[&str] = &[
    "I", "We", "He", "She", "It", "They", "You", "My", "Our", "His", "Her", "Their", "The", "A",
    "An", "This", "That", "These", "Those", "After", "Before", "Later", "Then", "There", "Here",
    "When", "While", "During", "But", "And", "So", "If", "As", "On", "In", "At", "First", "Next",
    "Finally", "Yesterday", "Today", "Tomorrow", "Monday", "Tuesday", "Wednesday", "Thursday",
    "Friday", "Saturday", "Sunday", "January", "February", "March", "April", "May", "June", "July",
    "August", "September", "October", "November", "December",
];

/// Lowercased tokens that, immediately before a span, mark it as a location.
const LOCATIVE_CUES: &[&str] = &[
    "in", "at", "to", "from", "near", "around", "through", "via", "toward", "towards", "outside",
    "inside", "visit", "visited", "visiting", "reached", "stayed", "left",
];

/// Words that mark a span as a place on their own.
const PLACE_WORDS: &[&str] = &[
    "tower", "museum", "hotel", "hostel", "park", "bridge", "castle", "cathedral", "church",
    "palace", "square", "street", "avenue", "boulevard", "station", "airport", "market", "temple",
    "mountain", "lake", "river", "beach", "island", "bay", "harbor", "harbour", "gallery", "opera",
    "garden", "gardens", "zoo", "stadium", "university", "library", "house", "hall", "monument",
    "fort", "valley", "canyon", "falls", "coast", "city", "village", "steakhouse", "restaurant",
    "cafe", "bar", "pier",
];

const POSITIVE_CUES: &[&str] = &[
    "love", "loved", "amazing", "beautiful", "wonderful", "great", "stunning", "enjoyed",
    "fantastic", "incredible", "charming", "delicious", "perfect", "breathtaking", "favorite",
    "favourite",
];

const NEGATIVE_CUES: &[&str] = &[
    "hate", "hated", "awful", "terrible", "disappointing", "disappointed", "dirty", "avoid",
    "worst", "overrated", "overpriced", "rude", "unpleasant",
];

/// Extraction backend that needs no network and no model.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for RuleBasedExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<RawMention>, ExtractionError> {
        let mentions = extract_mentions(text);
        debug!(count = mentions.len(), "rule-based extraction finished");
        Ok(mentions)
    }

    fn name(&self) -> &'static str {
        "ner"
    }
}

fn extract_mentions(text: &str) -> Vec<RawMention> {
    let mut mentions = Vec::new();
    for sentence in split_sentences(text) {
        let sentiment = sentence_sentiment(sentence);
        for span in candidate_spans(sentence) {
            mentions.push(RawMention {
                text: span,
                context: sentence.to_string(),
                sentiment,
                source: MentionSource::Ner,
            });
        }
    }
    mentions
}

/// Split on `.`/`!`/`?` followed by whitespace or end of input.
fn split_sentences(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    for i in 0..bytes.len() {
        if matches!(bytes[i], b'.' | b'!' | b'?')
            && (i + 1 == bytes.len() || bytes[i + 1].is_ascii_whitespace())
        {
            let sentence = text[start..=i].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = i + 1;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn candidate_spans(sentence: &str) -> Vec<String> {
    let tokens: Vec<&str> = sentence.split_whitespace().collect();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let word = clean_word(tokens[i]);
        if !starts_uppercase(&word) {
            i += 1;
            continue;
        }

        // Build a span of capitalised words, allowing single connectors
        // between them ("Statue of Liberty", "Gare du Nord").
        let span_start = i;
        let mut words = vec![word];
        let mut ends_clause = ends_with_punctuation(tokens[i]);
        i += 1;
        while i < tokens.len() && !ends_clause {
            let next = clean_word(tokens[i]);
            if starts_uppercase(&next) {
                ends_clause = ends_with_punctuation(tokens[i]);
                words.push(next);
                i += 1;
            } else if CONNECTORS.contains(&next.as_str())
                && i + 1 < tokens.len()
                && starts_uppercase(&clean_word(tokens[i + 1]))
            {
                words.push(next);
                i += 1;
            } else {
                break;
            }
        }

        // A leading article belongs to the sentence, not the name.
        if matches!(words[0].as_str(), "The" | "A" | "An") && words.len() > 1 {
            words.remove(0);
        }

        if words.iter().all(|w| STOPWORDS.contains(&w.as_str())) {
            continue;
        }

        let preceded_by_cue = span_start > 0
            && LOCATIVE_CUES.contains(&clean_word(tokens[span_start - 1]).to_lowercase().as_str());
        let contains_place_word = words
            .iter()
            .any(|w| PLACE_WORDS.contains(&w.to_lowercase().as_str()));
        let multi_word_proper = words.len() > 1 && span_start > 0;

        if preceded_by_cue || contains_place_word || multi_word_proper {
            spans.push(words.join(" "));
        }
    }

    spans
}

fn sentence_sentiment(sentence: &str) -> Sentiment {
    let lower = sentence.to_lowercase();
    let has = |cues: &[&str]| {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| cues.contains(&w))
    };
    match (has(POSITIVE_CUES), has(NEGATIVE_CUES)) {
        (true, true) => Sentiment::Neutral,
        (true, false) => Sentiment::Positive,
        (false, true) => Sentiment::Negative,
        (false, false) => Sentiment::Unknown,
    }
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_uppercase())
}

fn ends_with_punctuation(token: &str) -> bool {
    token
        .chars()
        .last()
        .is_some_and(|c| matches!(c, ',' | '.' | ';' | ':' | '!' | '?' | ')'))
}

/// Strip surrounding punctuation, keeping internal dots ("D.C.").
fn clean_word(token: &str) -> String {
    let stripped = token
        .trim_start_matches(['(', '"', '\'', '['])
        .trim_end_matches([',', ';', ':', '!', '?', ')', ']', '"', '\'']);
    // A trailing full stop is sentence punctuation unless the word is
    // dotted throughout, like an abbreviation.
    let inner_dots = stripped.trim_end_matches('.').contains('.');
    if !inner_dots {
        stripped.trim_end_matches('.').to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<String> {
        extract_mentions(text).into_iter().map(|m| m.text).collect()
    }

    #[test]
    fn simple_sentence() {
        let found = names("I visited the Eiffel Tower in Paris and stayed at the Marriott Hotel.");
        assert!(found.contains(&"Eiffel Tower".to_string()), "{found:?}");
        assert!(found.contains(&"Paris".to_string()), "{found:?}");
        assert!(found.contains(&"Marriott Hotel".to_string()), "{found:?}");
        assert!(!found.contains(&"I".to_string()));
    }

    #[test]
    fn multi_sentence_trip_report() {
        let text = "We started our trip in New York City, visiting the Empire State Building \
                    and having dinner at Peter Luger Steakhouse in Brooklyn. Later we went to \
                    Washington to see the White House and the Smithsonian Museum.";
        let found = names(text);
        assert!(found.contains(&"New York City".to_string()), "{found:?}");
        assert!(found.contains(&"Empire State Building".to_string()), "{found:?}");
        assert!(found.contains(&"Peter Luger Steakhouse".to_string()), "{found:?}");
        assert!(found.contains(&"Brooklyn".to_string()), "{found:?}");
        assert!(found.contains(&"White House".to_string()), "{found:?}");
        assert!(found.contains(&"Smithsonian Museum".to_string()), "{found:?}");
    }

    #[test]
    fn connector_span() {
        let found = names("We took photos of the Statue of Liberty from the ferry.");
        assert!(found.contains(&"Statue of Liberty".to_string()), "{found:?}");
    }

    #[test]
    fn context_is_the_containing_sentence() {
        let text = "First some filler. We loved the Eiffel Tower. More filler here.";
        let mentions = extract_mentions(text);
        let eiffel = mentions.iter().find(|m| m.text == "Eiffel Tower").unwrap();
        assert_eq!(eiffel.context, "We loved the Eiffel Tower.");
    }

    #[test]
    fn positive_sentiment_cue() {
        let mentions = extract_mentions("We loved the Eiffel Tower.");
        assert_eq!(mentions[0].sentiment, Sentiment::Positive);
    }

    #[test]
    fn negative_sentiment_cue() {
        let mentions = extract_mentions("The Louvre Museum was terrible and crowded.");
        assert_eq!(mentions[0].sentiment, Sentiment::Negative);
    }

    #[test]
    fn no_cue_is_unknown() {
        let mentions = extract_mentions("We walked past the Eiffel Tower.");
        assert_eq!(mentions[0].sentiment, Sentiment::Unknown);
    }

    #[test]
    fn mixed_cues_are_neutral() {
        let mentions =
            extract_mentions("The Eiffel Tower was beautiful but the queue was terrible.");
        assert_eq!(mentions[0].sentiment, Sentiment::Neutral);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(extract_mentions("").is_empty());
    }

    #[test]
    fn lowercase_text_yields_nothing() {
        assert!(extract_mentions("we wandered around the old town for hours.").is_empty());
    }

    #[test]
    fn sentence_splitting() {
        let sentences = split_sentences("One. Two! Three? Four");
        assert_eq!(sentences, ["One.", "Two!", "Three?", "Four"]);
    }

    #[test]
    fn abbreviation_dots_survive_cleaning() {
        assert_eq!(clean_word("D.C."), "D.C.");
        assert_eq!(clean_word("Paris."), "Paris");
        assert_eq!(clean_word("Brooklyn,"), "Brooklyn");
    }

    #[tokio::test]
    async fn extractor_trait_round_trip() {
        let extractor = RuleBasedExtractor::new();
        let mentions = extractor.extract("We stayed in Lisbon.").await.unwrap();
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].text, "Lisbon");
        assert_eq!(mentions[0].source, MentionSource::Ner);
    }
}
