//! Landmark categories relevant to a preference.

use std::sync::Arc;

use serde::Serialize;

use crate::traits::TextGenerator;
use crate::vocabulary::{LandmarkVocabulary, normalize_term};

/// Upper bound on landmark categories passed to the routing engine.
pub const MAX_LANDMARKS: usize = 10;

/// Distinct vocabulary terms, at most [`MAX_LANDMARKS`], in generator order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    terms: Vec<String>,
}

impl LandmarkSet {
    /// A set with no landmarks; the engine then ignores the landmark weight.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Keeps the first [`MAX_LANDMARKS`] distinct candidates found in `vocabulary`.
    pub fn filtered<I, S>(candidates: I, vocabulary: &LandmarkVocabulary) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut terms: Vec<String> = Vec::new();
        for candidate in candidates {
            let term = normalize_term(candidate.as_ref());
            if vocabulary.contains(&term) && !terms.contains(&term) {
                terms.push(term);
                if terms.len() == MAX_LANDMARKS {
                    break;
                }
            }
        }
        Self { terms }
    }

    /// Terms in generator order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Number of landmark terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns true when no landmark survived filtering.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LandmarkExtractor {
    vocabulary: Arc<LandmarkVocabulary>,
}

impl LandmarkExtractor {
    /// Candidates are filtered against `vocabulary`.
    pub fn new(vocabulary: Arc<LandmarkVocabulary>) -> Self {
        Self { vocabulary }
    }

    /// Landmarks are optional enrichment: any failure yields an empty set.
    pub fn extract<G: TextGenerator + ?Sized>(&self, generator: &G, preference: &str) -> LandmarkSet {
        let response = match generator.generate(&self.prompt(preference)) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "landmark extraction failed, continuing without landmarks");
                return LandmarkSet::empty();
            }
        };

        let candidates = response.split([',', '\n', '、']).collect::<Vec<_>>();
        let landmarks = LandmarkSet::filtered(candidates.iter(), &self.vocabulary);

        let dropped = candidates
            .iter()
            .filter(|c| !c.trim().is_empty())
            .count()
            .saturating_sub(landmarks.len());
        if dropped > 0 {
            tracing::debug!(dropped, "discarded landmark terms outside the vocabulary");
        }
        tracing::debug!(landmarks = ?landmarks.terms(), "extracted landmarks");

        landmarks
    }

    /// The instruction sent to the text-generation service.
    pub fn prompt(&self, preference: &str) -> String {
        format!(
            r#"Pick the words from the word list that relate to the input sentence.

Rules:
- Only use words that appear in the word list.
- Pick at most {MAX_LANDMARKS} words.
- Output the words as a single comma-separated line, as in the examples.

Examples:
1. museum, library, hospital
2. outdoor, photo, bench
3. restaurant, bar, cafe

Word list:
{words}

Input sentence:
{preference}"#,
            words = self.vocabulary.terms().join(", "),
        )
    }
}
