//! `OpenAI` chat completions provider implementation.
//!
//! Also used for `OpenAI`-compatible servers by overriding the base URL.

use serde::{Deserialize, Serialize};

use super::{LlmProvider, LlmResponse, Message, StopReason};
use crate::AiError;

/// Model used when `AI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Base URL of the hosted `OpenAI` API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// `OpenAI` API provider.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a new `OpenAI` provider.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Points the provider at an `OpenAI`-compatible server, e.g.
    /// `http://localhost:11434/v1`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

fn build_messages<'a>(system_prompt: &'a str, messages: &'a [Message]) -> Vec<OpenAiMessage<'a>> {
    std::iter::once(OpenAiMessage {
        role: "system",
        content: system_prompt,
    })
    .chain(messages.iter().map(|m| OpenAiMessage {
        role: &m.role,
        content: &m.content,
    }))
    .collect()
}

fn into_response(response: OpenAiResponse) -> Result<LlmResponse, AiError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AiError::Provider {
            message: "No choices in OpenAI response".to_string(),
        })?;

    let stop_reason = match choice.finish_reason.as_deref() {
        Some("length") => StopReason::MaxTokens,
        _ => StopReason::EndTurn,
    };

    Ok(LlmResponse {
        text: choice.message.content.unwrap_or_default(),
        stop_reason,
    })
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<LlmResponse, AiError> {
        let request = OpenAiRequest {
            model: &self.model,
            messages: build_messages(system_prompt, messages),
            max_tokens: 4096,
        };

        let mut builder = self
            .client
            .post(self.completions_url())
            .header("Content-Type", "application/json");
        if !self.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let resp = builder.json(&request).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(AiError::Provider {
                message: super::error_message(status, &body),
            });
        }

        let response: OpenAiResponse = serde_json::from_str(&body)?;
        into_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_leads_the_message_list() {
        let messages = [Message::user("datos")];
        let built = build_messages("sys", &messages);

        assert_eq!(built.len(), 2);
        assert_eq!(built[0].role, "system");
        assert_eq!(built[0].content, "sys");
        assert_eq!(built[1].role, "user");
    }

    #[test]
    fn base_url_override_builds_completions_url() {
        let provider = OpenAiProvider::new(String::new(), DEFAULT_MODEL.to_string());
        assert_eq!(
            provider.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );

        let local = provider.with_base_url("http://localhost:11434/v1/".to_string());
        assert_eq!(
            local.completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"ok"},"finish_reason":"length"}]}"#;
        let response = into_response(serde_json::from_str(body).unwrap()).unwrap();
        assert_eq!(response.text, "ok");
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
    }

    #[test]
    fn missing_choices_is_a_provider_error() {
        let response: OpenAiResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            into_response(response),
            Err(AiError::Provider { .. })
        ));
    }
}
