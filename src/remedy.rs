//! Remedy Resolver
//!
//! Turns a classifier label such as `Tomato___Early_blight` into a canned
//! treatment recommendation.
//!
//! Matching is by substring: the first catalog keyword contained in the
//! lower-cased label wins. [`REMEDY_CATALOG`] is therefore an ordered slice,
//! not a map, and its order decides precedence when a label contains more
//! than one keyword.

use serde::Serialize;

/// Delimiter between the crop qualifier and the disease phrase in dataset labels
pub const QUALIFIER_DELIMITER: &str = "___";

/// Advisory returned when no catalog keyword matches
pub const UNKNOWN_DISEASE_ADVISORY: &str = "Unknown disease. Dataset label may be incorrect.";

/// Keyword/advisory pairs, matched in declaration order. Keywords are lowercase.
pub const REMEDY_CATALOG: &[(&str, &str)] = &[
    ("healthy", "The leaf is healthy. No treatment required."),
    (
        "bacterial spot",
        "- Apply copper fungicides.\n- Avoid overhead watering.",
    ),
    (
        "leaf mold",
        "- Use sulfur fungicides.\n- Increase ventilation.",
    ),
    (
        "early blight",
        "- Use mancozeb/chlorothalonil.\n- Remove infected leaves.",
    ),
    (
        "late blight",
        "- Apply copper sulfate.\n- Destroy infected plants.",
    ),
    (
        "septoria",
        "- Use chlorothalonil or mancozeb.\n- Prune lower leaves.",
    ),
];

/// A classifier label cleaned up for lookup and display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedLabel {
    /// Lower-cased form used for keyword matching, e.g. `early blight`
    pub matching: String,
    /// Title-cased form for display, e.g. `Early Blight`
    pub display: String,
}

impl NormalizedLabel {
    /// True when nothing is left after normalization
    pub fn is_empty(&self) -> bool {
        self.matching.is_empty()
    }
}

impl std::fmt::Display for NormalizedLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display)
    }
}

/// Outcome of a catalog lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Advisory {
    /// Catalog keyword that matched, `None` for the unknown-disease sentinel
    pub keyword: Option<&'static str>,
    /// Treatment text
    pub text: &'static str,
}

impl Advisory {
    /// The unknown-disease sentinel
    pub const UNKNOWN: Advisory = Advisory {
        keyword: None,
        text: UNKNOWN_DISEASE_ADVISORY,
    };

    /// True for the unknown-disease sentinel
    pub fn is_unknown(&self) -> bool {
        self.keyword.is_none()
    }
}

/// Strip the crop qualifier, turn underscores into spaces and trim
///
/// Everything up to and including the last `___` is dropped, so
/// `Tomato___Early_blight` becomes `early blight` / `Early Blight`.
pub fn normalize(raw_label: &str) -> NormalizedLabel {
    let disease = match raw_label.rfind(QUALIFIER_DELIMITER) {
        Some(idx) => &raw_label[idx + QUALIFIER_DELIMITER.len()..],
        None => raw_label,
    };
    let spaced = disease.replace('_', " ");
    let trimmed = spaced.trim();

    NormalizedLabel {
        matching: trimmed.to_lowercase(),
        display: title_case(trimmed),
    }
}

/// Look up the advisory for a label. Never fails.
///
/// The label is lower-cased before matching, so both the matching and the
/// display form of a [`NormalizedLabel`] resolve the same way.
pub fn resolve(label: &str) -> Advisory {
    let label = label.to_lowercase();

    REMEDY_CATALOG
        .iter()
        .find(|(keyword, _)| label.contains(keyword))
        .map(|&(keyword, text)| Advisory {
            keyword: Some(keyword),
            text,
        })
        .unwrap_or(Advisory::UNKNOWN)
}

/// Normalize a raw classifier label and resolve it in one step
pub fn lookup(raw_label: &str) -> (NormalizedLabel, Advisory) {
    let normalized = normalize(raw_label);
    let advisory = resolve(&normalized.matching);
    (normalized, advisory)
}

/// Upper-case the first letter of every word, lower-case the rest.
/// A word starts after any non-alphabetic character.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }

    out
}
