//! LLM provider abstraction and implementations.
//!
//! Supports Anthropic Claude and `OpenAI`-compatible chat completions via a
//! common trait.

pub mod anthropic;
pub mod openai;

use serde::{Deserialize, Serialize};

use crate::AiError;

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role: "user" or "assistant".
    pub role: String,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from the LLM provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    /// Concatenated text content of the reply.
    pub text: String,
    /// Why the model stopped generating.
    pub stop_reason: StopReason,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Model finished its response naturally.
    EndTurn,
    /// Maximum tokens reached.
    MaxTokens,
}

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails.
    async fn chat(&self, system_prompt: &str, messages: &[Message])
    -> Result<LlmResponse, AiError>;
}

/// Creates an LLM provider based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `ANTHROPIC_API_KEY` set -> Anthropic Claude
/// 2. `OPENAI_API_KEY` or `AI_BASE_URL` set -> `OpenAI`-compatible
///
/// `AI_MODEL` overrides the default model and `AI_BASE_URL` points the
/// `OpenAI` provider at a compatible server, in which case the API key is
/// optional.
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_provider_from_env() -> Result<Box<dyn LlmProvider>, AiError> {
    let provider = std::env::var("AI_PROVIDER").unwrap_or_else(|_| detect_provider());

    match provider.to_lowercase().as_str() {
        "anthropic" | "claude" => {
            let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| AiError::Config {
                message: "ANTHROPIC_API_KEY environment variable not set".to_string(),
            })?;
            let model = std::env::var("AI_MODEL")
                .unwrap_or_else(|_| anthropic::DEFAULT_MODEL.to_string());
            Ok(Box::new(anthropic::AnthropicProvider::new(api_key, model)))
        }
        "openai" | "gpt" => {
            let base_url = std::env::var("AI_BASE_URL").ok();
            let api_key = match (std::env::var("OPENAI_API_KEY"), &base_url) {
                (Ok(key), _) => key,
                (Err(_), Some(_)) => String::new(),
                (Err(_), None) => {
                    return Err(AiError::Config {
                        message: "OPENAI_API_KEY environment variable not set".to_string(),
                    });
                }
            };
            let model =
                std::env::var("AI_MODEL").unwrap_or_else(|_| openai::DEFAULT_MODEL.to_string());
            let mut provider = openai::OpenAiProvider::new(api_key, model);
            if let Some(base_url) = base_url {
                log::info!("Using OpenAI-compatible endpoint at {base_url}");
                provider = provider.with_base_url(base_url);
            }
            Ok(Box::new(provider))
        }
        other => Err(AiError::Config {
            message: format!("Unknown AI provider: {other}. Use 'anthropic' or 'openai'."),
        }),
    }
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns a provider name string that matches the arms in
/// [`create_provider_from_env`].
fn detect_provider() -> String {
    if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return "anthropic".to_string();
    }

    if std::env::var("OPENAI_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: OpenAI (OPENAI_API_KEY found)");
        return "openai".to_string();
    }

    if std::env::var("AI_BASE_URL").is_ok() {
        log::info!("Auto-detected AI provider: OpenAI-compatible (AI_BASE_URL found)");
        return "openai".to_string();
    }

    log::warn!(
        "No AI credentials detected. Set one of: ANTHROPIC_API_KEY, OPENAI_API_KEY, \
         or AI_BASE_URL. You can also set AI_PROVIDER explicitly."
    );

    // Fall back to anthropic so the caller gets a clear missing-key error
    "anthropic".to_string()
}

/// Extracts `error.message` from a provider error body, falling back to
/// the raw status and body.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| format!("HTTP {status}: {body}"), |e| e.error.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_provider_detail() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"bad model"}}"#;
        assert_eq!(
            error_message(reqwest::StatusCode::BAD_REQUEST, body),
            "bad model"
        );
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        let message = error_message(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(message.contains("502"));
        assert!(message.contains("upstream down"));
    }
}
