//! Streaming client for the Anthropic Messages API.
//!
//! One persistent `reqwest::Client` is shared across requests; each call
//! is a self-contained POST whose SSE response is exposed as a stream of
//! text deltas. The stream ends on `message_stop`; upstream `error`
//! events surface as stream errors.

mod error;
mod sse;

pub use error::{Error, Result};

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use sse::{LineBuffer, SseEvent, parse_line};

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Incremental text of one generated response.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

pub struct ChatClientBuilder {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: u32,
}

impl Default for ChatClientBuilder {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key: None,
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl ChatClientBuilder {
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn build(self) -> ChatClient {
        ChatClient {
            http: reqwest::Client::new(),
            api_base: self
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: self.api_key.expect("api_key is required"),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: self.max_tokens,
        }
    }
}

pub struct ChatClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ChatClient {
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::default()
    }

    /// Starts one generation and returns its delta stream.
    ///
    /// Fails here (request build, connect, non-2xx status) when the
    /// upstream dies before producing any text; later failures arrive
    /// as stream items.
    pub async fn stream_message(
        &self,
        system: &str,
        history: &[ChatMessage],
        user_text: &str,
    ) -> Result<TextStream> {
        let body = request_body(&self.model, self.max_tokens, system, history, user_text);

        let response = self
            .http
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(
                http_status = %status.as_u16(),
                "generation_request_rejected"
            );
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut bytes = response.bytes_stream();
        let stream = async_stream::try_stream! {
            let mut lines = LineBuffer::new();
            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk?;
                for line in lines.push(&chunk) {
                    match parse_line(&line) {
                        Some(SseEvent::Delta(text)) => yield text,
                        Some(SseEvent::Stop) => break 'read,
                        Some(SseEvent::Error(message)) => {
                            Err::<(), Error>(Error::Stream(message))?;
                        }
                        None => {}
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn request_body(
    model: &str,
    max_tokens: u32,
    system: &str,
    history: &[ChatMessage],
    user_text: &str,
) -> serde_json::Value {
    let mut messages: Vec<serde_json::Value> = history
        .iter()
        .map(|m| serde_json::json!({ "role": m.role, "content": m.content }))
        .collect();
    messages.push(serde_json::json!({ "role": Role::User, "content": user_text }));

    serde_json::json!({
        "model": model,
        "max_tokens": max_tokens,
        "system": system,
        "stream": true,
        "messages": messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_threads_history_in_order() {
        let history = vec![
            ChatMessage {
                role: Role::User,
                content: "what is water?".into(),
            },
            ChatMessage {
                role: Role::Assistant,
                content: "What do you already know about it?".into(),
            },
        ];

        let body = request_body("model-x", 512, "be brief", &history, "two hydrogens?");
        assert_eq!(body["model"], "model-x");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["stream"], true);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"], "two hydrogens?");
    }

    #[test]
    fn builder_defaults_applied() {
        let client = ChatClient::builder().api_key("k").build();
        assert_eq!(client.api_base, DEFAULT_API_BASE);
        assert_eq!(client.model, DEFAULT_MODEL);
        assert_eq!(client.max_tokens, DEFAULT_MAX_TOKENS);
    }
}
