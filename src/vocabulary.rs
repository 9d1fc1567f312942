//! The canonical landmark vocabulary.
//!
//! Loaded once at startup and shared read-only by every request.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

const BUILTIN_LANDMARKS: &str = include_str!("../data/landmarks.txt");

#[derive(Debug, Clone)]
pub struct LandmarkVocabulary {
    terms: Vec<String>,
    index: HashSet<String>,
}

impl LandmarkVocabulary {
    /// The vocabulary shipped with the crate.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_LANDMARKS)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let vocabulary = Self::parse(&text);
        if vocabulary.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "landmark vocabulary {} has no terms",
                path.display()
            )));
        }
        tracing::debug!(path = %path.display(), terms = vocabulary.len(), "loaded landmark vocabulary");
        Ok(vocabulary)
    }

    /// Terms separated by newlines or commas. `#` starts a comment line.
    pub fn parse(text: &str) -> Self {
        let mut terms = Vec::new();
        let mut index = HashSet::new();

        let candidates = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.starts_with('#'))
            .flat_map(|line| line.split(','))
            .map(normalize_term)
            .filter(|term| !term.is_empty());

        for term in candidates {
            if index.insert(term.clone()) {
                terms.push(term);
            }
        }

        Self { terms, index }
    }

    /// Exact match against normalized terms.
    pub fn contains(&self, term: &str) -> bool {
        self.index.contains(term)
    }

    /// Terms in file order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Lowercased and trimmed, surrounding quotes removed.
pub(crate) fn normalize_term(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_lowercase()
}
