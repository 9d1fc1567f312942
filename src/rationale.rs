//! A short account of what the resolved weights prioritise.
//!
//! Informational only: a failed call yields an empty text and the search
//! goes on.

use std::ops::RangeInclusive;

use crate::traits::TextGenerator;
use crate::weights::WeightVector;

/// Requested length of the rationale, in characters. Not enforced.
pub const RATIONALE_CHARS: RangeInclusive<usize> = 100..=150;

/// Explains a [`WeightVector`] in terms of the traveller's preference.
#[derive(Debug, Clone, Default)]
pub struct WeightRationale;

impl WeightRationale {
    pub fn new() -> Self {
        Self
    }

    /// Never fails: generator errors yield an empty string.
    pub fn describe<G: TextGenerator + ?Sized>(&self, generator: &G, preference: &str, weights: &WeightVector) -> String {
        let text = match generator.generate(&self.prompt(preference, weights)) {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                tracing::warn!(error = %err, "weight rationale failed, continuing without it");
                return String::new();
            }
        };

        let chars = text.chars().count();
        if !RATIONALE_CHARS.contains(&chars) {
            tracing::warn!(
                chars,
                min = RATIONALE_CHARS.start(),
                max = RATIONALE_CHARS.end(),
                "weight rationale length out of bounds"
            );
        }
        text
    }

    /// The instruction sent to the text-generation service.
    pub fn prompt(&self, preference: &str, weights: &WeightVector) -> String {
        let weights = weights
            .iter()
            .map(|(dim, value)| format!("- {}: {:.3}", dim.param_name(), value))
            .chain(std::iter::once(format!("- weight_landmarks: {:.3}", weights.landmarks())))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You present walking routes that match what a traveller asked for.
Using the preference and the weights below, explain what was considered important when choosing the route.

Rules:
- Write between {min} and {max} characters.
- Write in the language of the preference.
- Output only the explanation.

Preference:
{preference}

Weights:
{weights}"#,
            min = RATIONALE_CHARS.start(),
            max = RATIONALE_CHARS.end(),
        )
    }
}
