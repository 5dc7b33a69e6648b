#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Narrative insight generation over apprehension records.
//!
//! Supports Anthropic Claude, `OpenAI`, and any `OpenAI`-compatible
//! local/self-hosted server (Ollama, vLLM, llama.cpp, LM Studio) via the
//! `AI_BASE_URL` environment variable. The records are serialized as JSON
//! and sent to the model in a single chat turn; the model's text reply is
//! returned verbatim.

pub mod insights;
pub mod providers;

use thiserror::Error;

pub use insights::{InsightOptions, generate_insights};

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },

    /// There were no records to analyze.
    #[error("No records to analyze")]
    NoData,

    /// The model answered with no usable text.
    #[error("The model returned an empty response")]
    EmptyResponse,
}
