//! Two-stage generation: model attempt, then deterministic fallback.
//!
//! The model call runs at most once, under a timeout. Any [`LlmError`]
//! resolves to the fallback value, so [`Generated`] always carries a payload.

use crate::llm::{ChatClient, ChatMessage, ChatOptions, LlmError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where a generated payload came from
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Ai,
    Fallback,
}

/// A payload that is always present, tagged with its source
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Generated<T> {
    #[serde(flatten)]
    pub value: T,
    pub source: Source,
}

impl<T> Generated<T> {
    pub fn ai(value: T) -> Self {
        Self {
            value,
            source: Source::Ai,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            source: Source::Fallback,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Generated<U> {
        Generated {
            value: f(self.value),
            source: self.source,
        }
    }
}

/// A prepared model call
#[derive(Debug, Clone)]
pub struct Prompt {
    pub messages: Vec<ChatMessage>,
    pub options: ChatOptions,
}

impl Prompt {
    pub fn user(content: impl Into<String>, options: ChatOptions) -> Self {
        Self {
            messages: vec![ChatMessage::user(content)],
            options,
        }
    }
}

/// Run the model call and parse its reply
///
/// A missing client means no API key was configured.
pub async fn attempt<C, T, P>(
    client: Option<&C>,
    prompt: &Prompt,
    timeout: Duration,
    parse: P,
) -> Result<T, LlmError>
where
    C: ChatClient,
    P: FnOnce(&str) -> Result<T, LlmError>,
{
    let client = client.ok_or(LlmError::MissingApiKey)?;

    let reply = tokio::time::timeout(timeout, client.chat(&prompt.messages, &prompt.options))
        .await
        .map_err(|_| LlmError::Timeout(timeout.as_secs()))??;

    parse(&reply)
}

/// Turn a model outcome into a payload, using the fallback on any failure
pub fn resolve<T, F>(task: &str, outcome: Result<T, LlmError>, fallback: F) -> Generated<T>
where
    F: FnOnce() -> T,
{
    match outcome {
        Ok(value) => {
            tracing::info!("{}: using model response", task);
            Generated::ai(value)
        }
        Err(LlmError::MissingApiKey) => {
            tracing::debug!("{}: no API key configured, using fallback", task);
            Generated::fallback(fallback())
        }
        Err(e) => {
            tracing::warn!("{}: model call failed ({}), using fallback", task, e);
            Generated::fallback(fallback())
        }
    }
}

/// Attempt the model call and fall back on any failure
pub async fn generate<C, T, P, F>(
    task: &str,
    client: Option<&C>,
    prompt: &Prompt,
    timeout: Duration,
    parse: P,
    fallback: F,
) -> Generated<T>
where
    C: ChatClient,
    P: FnOnce(&str) -> Result<T, LlmError>,
    F: FnOnce() -> T,
{
    let outcome = attempt(client, prompt, timeout, parse).await;
    resolve(task, outcome, fallback)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted chat backend for tests
    pub struct ScriptedClient {
        reply: Result<String, LlmError>,
        delay: Option<Duration>,
        pub calls: AtomicUsize,
        pub last_messages: Mutex<Vec<ChatMessage>>,
    }

    impl ScriptedClient {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                delay: None,
                calls: AtomicUsize::new(0),
                last_messages: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(err: LlmError) -> Self {
            Self {
                reply: Err(err),
                delay: None,
                calls: AtomicUsize::new(0),
                last_messages: Mutex::new(Vec::new()),
            }
        }

        pub fn hanging(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::replying("{}")
            }
        }

        pub fn prompt_text(&self) -> String {
            self.last_messages
                .lock()
                .unwrap()
                .iter()
                .map(|m| m.content.clone())
                .collect::<Vec<_>>()
                .join("\n")
        }
    }

    impl ChatClient for ScriptedClient {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            _options: &ChatOptions,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_messages.lock().unwrap() = messages.to_vec();
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedClient;
    use super::*;
    use std::sync::atomic::Ordering;

    fn prompt() -> Prompt {
        Prompt::user("hello", ChatOptions::default())
    }

    fn parse_number(reply: &str) -> Result<u32, LlmError> {
        reply
            .trim()
            .parse()
            .map_err(|_| LlmError::Parse(reply.to_string()))
    }

    #[tokio::test]
    async fn test_uses_model_reply() {
        let client = ScriptedClient::replying("7");
        let result = generate(
            "test",
            Some(&client),
            &prompt(),
            Duration::from_secs(1),
            parse_number,
            || 0,
        )
        .await;

        assert_eq!(result, Generated::ai(7));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_client_falls_back() {
        let result = generate::<ScriptedClient, _, _, _>(
            "test",
            None,
            &prompt(),
            Duration::from_secs(1),
            parse_number,
            || 42,
        )
        .await;

        assert_eq!(result, Generated::fallback(42));
    }

    #[tokio::test]
    async fn test_parse_failure_falls_back() {
        let client = ScriptedClient::replying("not a number");
        let result = generate(
            "test",
            Some(&client),
            &prompt(),
            Duration::from_secs(1),
            parse_number,
            || 1,
        )
        .await;

        assert_eq!(result.source, Source::Fallback);
        assert_eq!(result.value, 1);
    }

    #[tokio::test]
    async fn test_api_error_falls_back() {
        let client = ScriptedClient::failing(LlmError::Api {
            status: 500,
            message: "boom".into(),
        });
        let result = generate(
            "test",
            Some(&client),
            &prompt(),
            Duration::from_secs(1),
            parse_number,
            || 3,
        )
        .await;

        assert_eq!(result, Generated::fallback(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let client = ScriptedClient::hanging(Duration::from_secs(60));
        let outcome = attempt(Some(&client), &prompt(), Duration::from_secs(10), parse_number).await;
        assert_eq!(outcome, Err(LlmError::Timeout(10)));

        let result = resolve("test", outcome, || 5);
        assert_eq!(result, Generated::fallback(5));
    }

    #[test]
    fn test_generated_serializes_flat() {
        #[derive(Serialize)]
        struct Payload {
            comment: &'static str,
        }

        let json = serde_json::to_value(Generated::fallback(Payload { comment: "ok" })).unwrap();
        assert_eq!(json["comment"], "ok");
        assert_eq!(json["source"], "fallback");
    }
}
