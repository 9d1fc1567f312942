//! Natural-language explanation of a retrieved route.
//!
//! The generator is asked for a JSON object; the answer is accepted only once
//! it parses and passes schema validation, otherwise the same prompt is
//! re-issued up to the retry bound.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ExplanationError;
use crate::model::{Coordinate, RouteDetail};
use crate::retrieval::RouteGeometry;
use crate::retry::RetryPolicy;
use crate::traits::TextGenerator;

pub const MAX_DETAILS: usize = 3;
pub const SUMMARY_CHARS: RangeInclusive<usize> = 150..=200;
pub const DETAIL_DESCRIPTION_CHARS: RangeInclusive<usize> = 50..=100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteExplanation {
    pub title: String,
    pub summary: String,
    /// At most [`MAX_DETAILS`] entries.
    pub details: Vec<RouteDetail>,
}

#[derive(Debug, Deserialize)]
struct RawExplanation {
    title: Option<String>,
    #[serde(alias = "description")]
    summary: Option<String>,
    details: Option<Vec<RawDetail>>,
}

#[derive(Debug, Deserialize)]
struct RawDetail {
    name: String,
    description: String,
    latitude: f64,
    longitude: f64,
}

/// Parses and validates one generator answer.
///
/// With `strict_bounds` the character bounds on the summary and detail
/// descriptions are enforced; otherwise violations are only logged.
pub fn parse_explanation(text: &str, strict_bounds: bool) -> Result<RouteExplanation, ExplanationError> {
    let raw: RawExplanation = serde_json::from_str(json_object(text))?;

    let title = required(raw.title, "title")?;
    let summary = required(raw.summary, "summary")?;
    let raw_details = raw
        .details
        .ok_or_else(|| ExplanationError::Schema("missing details".to_string()))?;

    if raw_details.len() > MAX_DETAILS {
        tracing::warn!(count = raw_details.len(), "explanation has too many details, keeping the first {}", MAX_DETAILS);
    }

    let details = raw_details
        .into_iter()
        .take(MAX_DETAILS)
        .map(|detail| {
            let location = Coordinate::new(detail.latitude, detail.longitude)
                .map_err(|err| ExplanationError::Schema(format!("detail {:?}: {err}", detail.name)))?;
            Ok(RouteDetail {
                name: detail.name,
                description: detail.description,
                location,
            })
        })
        .collect::<Result<Vec<_>, ExplanationError>>()?;

    check_length("summary", &summary, &SUMMARY_CHARS, strict_bounds)?;
    for detail in &details {
        check_length("detail description", &detail.description, &DETAIL_DESCRIPTION_CHARS, strict_bounds)?;
    }

    Ok(RouteExplanation { title, summary, details })
}

/// The text between the first `{` and the last `}`, so code fences and
/// surrounding prose do not matter.
fn json_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn required(value: Option<String>, key: &str) -> Result<String, ExplanationError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(ExplanationError::Schema(format!("{key} is empty"))),
        None => Err(ExplanationError::Schema(format!("missing {key}"))),
    }
}

fn check_length(
    field: &str,
    value: &str,
    bounds: &RangeInclusive<usize>,
    strict: bool,
) -> Result<(), ExplanationError> {
    let chars = value.chars().count();
    if bounds.contains(&chars) {
        return Ok(());
    }
    if strict {
        return Err(ExplanationError::Schema(format!(
            "{field} has {chars} characters, expected {}-{}",
            bounds.start(),
            bounds.end()
        )));
    }
    tracing::warn!(field, chars, min = bounds.start(), max = bounds.end(), "explanation length out of bounds");
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ExplanationGenerator {
    policy: RetryPolicy,
    strict_bounds: bool,
}

impl ExplanationGenerator {
    pub fn new(policy: RetryPolicy, strict_bounds: bool) -> Self {
        Self { policy, strict_bounds }
    }

    /// Returns a complete explanation, or the last failure once the retry
    /// bound is exhausted.
    pub fn explain<G: TextGenerator + ?Sized>(
        &self,
        generator: &G,
        preference: &str,
        route: &RouteGeometry,
        landmarks: Option<&RouteGeometry>,
    ) -> Result<RouteExplanation, ExplanationError> {
        let prompt = self.prompt(preference, route, landmarks);

        self.policy.run("explain_route", |attempt| {
            tracing::debug!(attempt, "requesting route explanation");
            let response = generator.generate(&prompt)?;
            parse_explanation(&response, self.strict_bounds)
        })
    }

    pub fn prompt(&self, preference: &str, route: &RouteGeometry, landmarks: Option<&RouteGeometry>) -> String {
        let landmarks = landmarks.map(RouteGeometry::as_str).unwrap_or("null");

        format!(
            r#"Read the first JSON document below and describe the walking route it contains.

Output a single JSON object with these keys:
- title: a title capturing the character of the whole route
- summary: a description of the whole route, {summary_min} to {summary_max} characters
- details: up to {max_details} highlights along the route that suit the preference "{preference}", each with name, description ({detail_min} to {detail_max} characters), latitude and longitude

Rules:
- If the second JSON document is not null, pick the details from it; otherwise pick them from the first.
- Write in the language of the preference.
- Output only the JSON object, exactly in the format of the examples.

Examples:
1. {{"title": "Green stroll", "summary": "A leafy route through parks and tree-lined streets with little traffic, so the walk stays quiet from start to finish. Benches and shade along the way make it an easy and refreshing break.", "details": [{{"name": "Central Park", "description": "A large park with lawns and tall trees, ideal for a short rest in the shade.", "latitude": 35.681236, "longitude": 139.767125}}]}}
2. {{"title": "Shortest way to the temple", "summary": "The most direct way to the temple. Part of the route follows narrow and dimly lit lanes, so take care after dark, but it saves time when you are in a hurry to arrive before the gates close.", "details": [{{"name": "Senso-ji", "description": "A historic temple that is always busy with visitors from around the world.", "latitude": 35.714765, "longitude": 139.796655}}, {{"name": "Nakamise street", "description": "A lively shopping street lined with snack stalls and souvenir shops.", "latitude": 35.711680, "longitude": 139.796370}}]}}

First JSON document (route):
{route}

Second JSON document (landmarks):
{landmarks}"#,
            summary_min = SUMMARY_CHARS.start(),
            summary_max = SUMMARY_CHARS.end(),
            max_details = MAX_DETAILS,
            detail_min = DETAIL_DESCRIPTION_CHARS.start(),
            detail_max = DETAIL_DESCRIPTION_CHARS.end(),
            route = route.as_str(),
        )
    }
}
