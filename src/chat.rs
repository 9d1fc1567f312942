//! OpenAI-compatible chat-completion adapter for text generation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::traits::TextGenerator;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL; requests go to `{url}/v1/chat/completions`.
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("ROUTE_FINDER_LLM_URL").unwrap_or_else(|_| "http://localhost:8000".to_string()),
            model: std::env::var("ROUTE_FINDER_LLM_MODEL")
                .unwrap_or_else(|_| "meta-llama/Llama-3.1-8B-Instruct".to_string()),
            api_key: std::env::var("ROUTE_FINDER_LLM_API_KEY").ok(),
            timeout_secs: 30,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    config: ChatConfig,
    client: reqwest::blocking::Client,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl TextGenerator for ChatClient {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut req = self.client.post(self.endpoint()).json(&request);
        if let Some(ref api_key) = self.config.api_key {
            req = req.bearer_auth(api_key);
        }

        let response = req.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response.json()?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = ChatClient::new(ChatConfig {
            url: "http://localhost:8000/".to_string(),
            ..ChatConfig::default()
        })
        .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "m",
            messages: [ChatMessage { role: "user", content: "hi" }],
            temperature: 0.5,
            max_tokens: 10,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["model"], "m");
    }

    #[test]
    fn test_response_shape() {
        let body: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"cafe, park"}}]}"#)
                .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("cafe, park"));
    }

    #[test]
    fn test_unreachable_service_is_an_error() {
        let client = ChatClient::new(ChatConfig {
            url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..ChatConfig::default()
        })
        .unwrap();
        assert!(matches!(client.generate("hello"), Err(GenerationError::Http(_))));
    }
}
