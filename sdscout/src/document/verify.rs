//! Content verification of extracted text.

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::identifier::{Identifier, REQUIRED_PHRASE};

/// Outcome of checking one document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    /// True iff every constraint matched.
    pub verified: bool,
    /// Every constraint evaluated, in evaluation order.
    pub constraints: Vec<String>,
    /// Constraints that did not match.
    pub missing: Vec<String>,
}

/// Checks extracted text against the required phrase and the identifier.
///
/// Each constraint is a whole-word, case-insensitive match. Words of a
/// multi-word constraint may be separated by any whitespace. Word boundaries
/// are only asserted at edges that are word characters.
#[derive(Debug, Clone, Default)]
pub struct Verifier;

impl Verifier {
    /// Creates a verifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Verifies `text` for the given identifier.
    #[must_use]
    pub fn verify(&self, text: &str, identifier: &Identifier) -> Verification {
        let mut constraints = vec![REQUIRED_PHRASE.to_string()];
        if let Some(ref number) = identifier.registry_number {
            constraints.push(number.as_str().to_string());
        }
        if let Some(ref name) = identifier.name {
            constraints.push(name.clone());
        }

        let missing: Vec<String> = constraints
            .iter()
            .filter(|c| !contains_term(text, c))
            .cloned()
            .collect();

        Verification {
            verified: missing.is_empty(),
            constraints,
            missing,
        }
    }
}

/// Whole-word, case-insensitive search for `term` in `text`.
#[must_use]
pub fn contains_term(text: &str, term: &str) -> bool {
    match term_pattern(term) {
        Some(pattern) => pattern.is_match(text),
        None => false,
    }
}

fn term_pattern(term: &str) -> Option<Regex> {
    let words: Vec<String> = term.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }
    let body = words.join(r"\s+");
    let start = if term.trim_start().starts_with(is_word_char) { r"\b" } else { "" };
    let end = if term.trim_end().ends_with(is_word_char) { r"\b" } else { "" };
    RegexBuilder::new(&format!("{start}{body}{end}"))
        .case_insensitive(true)
        .build()
        .map_err(|e| tracing::warn!(term, error = %e, "Verification pattern rejected"))
        .ok()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
