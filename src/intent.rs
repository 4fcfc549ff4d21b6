//! Rule-based intent classification and place extraction
//!
//! Free-text queries such as "Plan my trip to Bangalore" are reduced to a
//! place name and an [`Intent`]. Precedence and tie-breaking live in the
//! ordered tables below rather than in control flow:
//!
//! - [`INTENT_RULES`]: first rule whose keyword occurs wins; a widening word
//!   alongside it turns the intent into [`Intent::Combined`].
//! - [`LEAD_IN_PHRASES`]: first phrase (in table order) found anywhere in the
//!   query marks where the place starts.
//! - [`TRAILING_SEPARATORS`]: the leftmost occurrence of any separator marks
//!   where the place ends.
//!
//! This is a best-effort heuristic, not a grammar: there is no backtracking
//! across alternative matches.

use serde::{Deserialize, Serialize};

use crate::models::Intent;

/// Maps keywords to an intent
#[derive(Debug, Clone, Copy)]
pub struct IntentRule {
    pub keywords: &'static [&'static str],
    pub intent: Intent,
    /// Any of these alongside a keyword widens the intent to `Combined`
    pub widened_by: &'static [&'static str],
}

/// Evaluated top to bottom over the lower-cased query
pub const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        keywords: &["temperature", "weather"],
        intent: Intent::Weather,
        widened_by: &["plan", "trip", "visit", "places", "attractions", "go to"],
    },
    IntentRule {
        keywords: &["hotel", "stay"],
        intent: Intent::Accommodation,
        widened_by: &[],
    },
    IntentRule {
        keywords: &["restaurant", "food", "eat"],
        intent: Intent::Food,
        widened_by: &[],
    },
    IntentRule {
        keywords: &["plan", "trip", "visit"],
        intent: Intent::PlanTrip,
        widened_by: &[],
    },
];

/// Substrings that mark a short query as a sentence, matched case-sensitively
pub const NATURAL_LANGUAGE_MARKERS: &[&str] = &[" and ", " what "];

/// Queries with more words than this are always treated as sentences
pub const PLAIN_PLACE_MAX_WORDS: usize = 3;

/// Phrases after which the place name starts. Earlier entries win, so
/// specific phrases precede the generic ones they contain.
pub const LEAD_IN_PHRASES: &[&str] = &[
    "plan my trip to ",
    "plan a trip to ",
    "planning a trip to ",
    "plan my visit to ",
    "what is the temperature in ",
    "what's the temperature in ",
    "what is the weather in ",
    "what's the weather in ",
    "how is the weather in ",
    "how's the weather in ",
    "weather in ",
    "temperature in ",
    "going to go to ",
    "places to visit in ",
    "things to do in ",
    "attractions in ",
    "restaurants in ",
    "restaurant in ",
    "places to eat in ",
    "food in ",
    "eat in ",
    "hotels in ",
    "hotel in ",
    "places to stay in ",
    "stay in ",
    "accommodation in ",
    "places in ",
    "going to ",
    "travelling to ",
    "traveling to ",
    "travel to ",
    "trip to ",
    "heading to ",
    "want to visit ",
    "visiting ",
    "visit ",
    " in ",
];

/// Separators after which the place name ends. The leftmost match wins.
pub const TRAILING_SEPARATORS: &[&str] = &[
    " what is the weather",
    " what is the temperature",
    " what's the",
    " what ",
    " and ",
    " let's ",
    " let\u{2019}s ",
    " where ",
    " how ",
    " when ",
    " for ",
    " this ",
    " next ",
    " tomorrow",
    " today",
    " there",
    ",",
    ";",
    "?",
    "!",
];

const TRAILING_PUNCTUATION: &[char] = &[',', '.', '?', '!'];

/// Place name and intent derived from one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub place: String,
    pub intent: Intent,
}

/// Classify a raw query.
///
/// Short inputs without sentence markers are taken verbatim (trimmed) as a
/// place name with [`Intent::Combined`].
#[must_use]
pub fn classify(query: &str) -> Classification {
    let query = query.trim();

    if !looks_like_natural_language(query) {
        return Classification {
            place: query.to_string(),
            intent: Intent::Combined,
        };
    }

    Classification {
        place: extract_place(query),
        intent: classify_intent(query),
    }
}

/// Whether the query reads like a sentence rather than a bare place name
#[must_use]
pub fn looks_like_natural_language(query: &str) -> bool {
    if query.split_whitespace().count() > PLAIN_PLACE_MAX_WORDS {
        return true;
    }
    NATURAL_LANGUAGE_MARKERS
        .iter()
        .any(|marker| query.contains(marker))
}

/// Apply [`INTENT_RULES`] to a query
#[must_use]
pub fn classify_intent(query: &str) -> Intent {
    let lowered = query.to_lowercase();

    INTENT_RULES
        .iter()
        .find(|rule| contains_any(&lowered, rule.keywords))
        .map(|rule| {
            if contains_any(&lowered, rule.widened_by) {
                Intent::Combined
            } else {
                rule.intent
            }
        })
        .unwrap_or_default()
}

/// Pull the place name out of a sentence.
///
/// Never returns an empty string unless the query itself is blank: when
/// nothing usable is left the trimmed query is returned whole.
#[must_use]
pub fn extract_place(query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        return String::new();
    }

    if let Some((head, _)) = query.split_once(',') {
        let head = head.trim();
        let words = head.split_whitespace().count();
        if (1..=PLAIN_PLACE_MAX_WORDS).contains(&words) {
            return head.to_string();
        }
    }

    let working = truncate_at_separator(after_lead_in(query));
    let place = working
        .trim()
        .trim_end_matches(TRAILING_PUNCTUATION)
        .trim_end();

    if place.is_empty() {
        query.to_string()
    } else {
        place.to_string()
    }
}

/// Text following the first lead-in phrase in table order, or the whole text
fn after_lead_in(text: &str) -> &str {
    // ASCII lowering keeps byte offsets aligned with `text`
    let lowered = text.to_ascii_lowercase();
    LEAD_IN_PHRASES
        .iter()
        .find_map(|phrase| {
            lowered
                .find(phrase)
                .map(|index| &text[index + phrase.len()..])
        })
        .unwrap_or(text)
}

/// Text before the leftmost trailing separator, or the whole text
fn truncate_at_separator(text: &str) -> &str {
    let lowered = text.to_ascii_lowercase();
    TRAILING_SEPARATORS
        .iter()
        .filter_map(|separator| lowered.find(separator))
        .min()
        .map_or(text, |index| &text[..index])
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
