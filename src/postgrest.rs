//! PostgREST adapter for the routing engine's `generate_route` function.
//!
//! PostgREST exposes stored functions at `/rpc/<name>`; the named parameters
//! travel as a JSON object and the result rows come back as a JSON array.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;
use crate::retrieval::{RouteRequest, RouteRow};
use crate::traits::RoutingEngine;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgrestConfig {
    pub base_url: String,
    pub function: String,
    /// Result column holding the route geometry.
    pub route_column: String,
    /// Result column holding the landmark geometry, if any.
    pub landmarks_column: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PostgrestConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("ROUTE_FINDER_ENGINE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            function: "generate_route".to_string(),
            route_column: "route".to_string(),
            landmarks_column: "landmarks".to_string(),
            api_key: std::env::var("ROUTE_FINDER_ENGINE_API_KEY").ok(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgrestEngine {
    config: PostgrestConfig,
    client: reqwest::blocking::Client,
}

impl PostgrestEngine {
    pub fn new(config: PostgrestConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/rpc/{}", self.config.base_url.trim_end_matches('/'), self.config.function)
    }

    /// Picks the configured columns out of the first row.
    fn first_row(&self, rows: Vec<Value>) -> Result<Option<RouteRow>, EngineError> {
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let columns = match row {
            Value::Object(columns) => columns,
            other => return Err(EngineError::Decode(format!("expected a row object, got {other}"))),
        };

        let route = column_text(columns.get(&self.config.route_column));
        let landmarks = column_text(columns.get(&self.config.landmarks_column));
        Ok(Some(RouteRow::new(vec![route, landmarks])))
    }
}

/// Text columns pass through, JSON columns are re-serialized.
fn column_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

impl RoutingEngine for PostgrestEngine {
    fn generate_route(&self, request: &RouteRequest) -> Result<Option<RouteRow>, EngineError> {
        let mut req = self.client.post(self.endpoint()).json(&request.params());
        if let Some(ref api_key) = self.config.api_key {
            req = req.bearer_auth(api_key);
        }

        let response = req.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EngineError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text()?;
        self.first_row(parse_rows(&body)?)
    }
}

/// The result rows of an RPC response body: an array, a single object, or
/// `null` for no rows.
fn parse_rows(body: &str) -> Result<Vec<Value>, EngineError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| EngineError::Decode(format!("response body is not JSON: {err}")))?;
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        single @ Value::Object(_) => Ok(vec![single]),
        other => Err(EngineError::Decode(format!("unexpected response body {other}"))),
    }
}
