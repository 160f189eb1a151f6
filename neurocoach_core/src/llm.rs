//! Language-model collaborator boundary.
//!
//! Generators talk to the model through [`ChatClient`]. The shipped adapter,
//! [`OpenAiCompatibleClient`], speaks the OpenAI chat-completions protocol
//! (OpenRouter by default). Every failure is an [`LlmError`]; callers never
//! surface it and use their fallback instead.

use crate::config::LlmConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// ---------------------------------------------------------------------------
/// Messages
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling options for one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    /// Overrides the client's default model
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }
}

/// A chat-completion backend
pub trait ChatClient: Send + Sync {
    /// Send messages in order and return the generated text
    fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// ---------------------------------------------------------------------------
/// OpenAI-compatible API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// ---------------------------------------------------------------------------
/// OpenAI-compatible Client
/// ---------------------------------------------------------------------------

pub struct OpenAiCompatibleClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    referer: String,
    title: String,
}

impl OpenAiCompatibleClient {
    /// Build a client from configuration; fails without an API key
    pub fn from_config(config: &LlmConfig, app_name: &str) -> Result<Self, LlmError> {
        let api_key = config.api_key().ok_or(LlmError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            referer: config.referer.clone(),
            title: app_name.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl ChatClient for OpenAiCompatibleClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: options.model.as_deref().unwrap_or(&self.model),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("No message content in response".to_string()))
    }
}

/// Extract a JSON object from a model reply (handles prose and markdown fences)
pub fn extract_json(text: &str) -> Result<&str, LlmError> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Ok(trimmed);
    }

    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return Ok(text[start..start + end].trim());
        }
    }

    // Widest brace span, as models often add commentary around the object
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return Ok(&text[start..=end]);
        }
    }

    Err(LlmError::Parse(
        "Could not extract JSON from response".to_string(),
    ))
}

/// Extract and deserialize a JSON object from a model reply
pub fn parse_json_reply<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let json = extract_json(text)?;
    serde_json::from_str(json).map_err(|e| LlmError::Parse(format!("{}: {}", e, json)))
}

/// Field decoders for model replies.
///
/// Models drift from the requested schema in harmless ways: `30.0` where an
/// integer was asked for, or a difficulty tier outside the list. These accept
/// such values and still reject fractional or negative numbers.
pub(crate) mod lenient {
    use crate::Difficulty;
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(i64),
        Float(f64),
    }

    fn whole(number: Number) -> Result<u32, String> {
        let value = match number {
            Number::Int(i) if i >= 0 => i as f64,
            Number::Float(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => f,
            Number::Int(i) => return Err(format!("expected a non-negative whole number, got {}", i)),
            Number::Float(f) => return Err(format!("expected a non-negative whole number, got {}", f)),
        };
        if value > f64::from(u32::MAX) {
            return Err(format!("number out of range: {}", value));
        }
        Ok(value as u32)
    }

    pub fn whole_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        whole(Number::deserialize(deserializer)?).map_err(de::Error::custom)
    }

    pub fn optional_whole_u32<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u32>, D::Error> {
        Option::<Number>::deserialize(deserializer)?
            .map(whole)
            .transpose()
            .map_err(de::Error::custom)
    }

    pub fn difficulty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Difficulty, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .map(|s| Difficulty::parse_lenient(&s))
            .unwrap_or_default())
    }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: String) -> LlmConfig {
        LlmConfig {
            api_key: Some("test-key".into()),
            base_url,
            timeout_secs: 5,
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_extract_json_direct() {
        let input = r#"{"mode": "rage", "confidence": 0.9}"#;
        assert_eq!(extract_json(input).unwrap(), input);
    }

    #[test]
    fn test_extract_json_code_block() {
        let input = r#"Вот результат:

```json
{"mode": "boost"}
```

Удачи!"#;
        assert_eq!(extract_json(input).unwrap(), r#"{"mode": "boost"}"#);
    }

    #[test]
    fn test_extract_json_fallback() {
        let input = r#"The answer is {"mode": "neutral"} as shown."#;
        assert_eq!(extract_json(input).unwrap(), r#"{"mode": "neutral"}"#);
    }

    #[test]
    fn test_extract_json_missing() {
        assert!(matches!(
            extract_json("no json here"),
            Err(LlmError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_api_key() {
        let config = LlmConfig::default();
        let result = OpenAiCompatibleClient::from_config(&config, "test");
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[tokio::test]
    async fn test_chat_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Так держать!"}}]}"#)
            .create_async()
            .await;

        let client = OpenAiCompatibleClient::from_config(&test_config(server.url()), "test")
            .unwrap();
        let reply = client
            .chat(&[ChatMessage::user("hi")], &ChatOptions::with_temperature(0.7))
            .await
            .unwrap();

        assert_eq!(reply, "Так держать!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"invalid key"}}"#)
            .create_async()
            .await;

        let client = OpenAiCompatibleClient::from_config(&test_config(server.url()), "test")
            .unwrap();
        let err = client
            .chat(&[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            LlmError::Api {
                status: 401,
                message: "invalid key".into()
            }
        );
    }

    #[tokio::test]
    async fn test_chat_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = OpenAiCompatibleClient::from_config(&test_config(server.url()), "test")
            .unwrap();
        let err = client
            .chat(&[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Parse(_)));
    }
}
