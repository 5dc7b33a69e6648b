//! Anthropic Claude provider implementation.

use serde::{Deserialize, Serialize};

use super::{LlmProvider, LlmResponse, Message, StopReason};
use crate::AiError;

/// Model used when `AI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic Claude API provider.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

fn into_response(response: AnthropicResponse) -> LlmResponse {
    let text = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text),
            AnthropicContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    let stop_reason = match response.stop_reason.as_deref() {
        Some("max_tokens") => StopReason::MaxTokens,
        _ => StopReason::EndTurn,
    };

    LlmResponse { text, stop_reason }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<LlmResponse, AiError> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: 4096,
            system: system_prompt,
            messages,
        };

        let resp = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(AiError::Provider {
                message: super::error_message(status, &body),
            });
        }

        let response: AnthropicResponse = serde_json::from_str(&body)?;
        Ok(into_response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_text_blocks_and_ignores_others() {
        let body = r#"{
            "content": [
                {"type": "text", "text": "Tendencia 1"},
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Tendencia 2"}
            ],
            "stop_reason": "end_turn"
        }"#;
        let response = into_response(serde_json::from_str(body).unwrap());

        assert_eq!(response.text, "Tendencia 1\nTendencia 2");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
    }

    #[test]
    fn maps_max_tokens_stop_reason() {
        let body = r#"{"content": [], "stop_reason": "max_tokens"}"#;
        let response = into_response(serde_json::from_str(body).unwrap());
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
        assert!(response.text.is_empty());
    }

    #[test]
    fn request_serializes_messages_as_plain_text() {
        let messages = [Message::user("hola")];
        let request = AnthropicRequest {
            model: DEFAULT_MODEL,
            max_tokens: 10,
            system: "sys",
            messages: &messages,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hola");
        assert_eq!(json["system"], "sys");
    }
}
