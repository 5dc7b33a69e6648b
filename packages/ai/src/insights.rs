//! Narrative insights over a record set.

use aprehensys_apprehension_models::Apprehension;

use crate::AiError;
use crate::providers::{LlmProvider, Message, StopReason};

/// Records sent to the model when no other limit is configured.
pub const DEFAULT_MAX_RECORDS: usize = 50;

/// Language the insights are written in when none is configured.
pub const DEFAULT_LANGUAGE: &str = "español";

/// Controls how much data is sent and how the answer is phrased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightOptions {
    /// Only the first `max_records` records are serialized into the
    /// prompt.
    pub max_records: usize,
    /// Language the model must answer in.
    pub language: String,
}

impl Default for InsightOptions {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

fn system_prompt(language: &str) -> String {
    format!(
        "Eres un analista de datos experto especializado en datos de fuerzas del orden. \
         Tu tarea es analizar los datos de aprehensiones proporcionados y extraer ideas y \
         tendencias clave. Identifica patrones, anomalías y correlaciones significativas en \
         los datos. Presenta las ideas de una manera concisa y fácil de entender. \
         La respuesta debe estar en {language}."
    )
}

/// Serializes the leading `max_records` records into the user message.
///
/// # Errors
///
/// Returns [`AiError::Json`] if the records cannot be serialized.
pub fn build_user_message(records: &[Apprehension], max_records: usize) -> Result<Message, AiError> {
    let sample = &records[..records.len().min(max_records)];
    let data = serde_json::to_string(sample)?;
    Ok(Message::user(format!("Datos de Aprehensión: {data}")))
}

/// Asks `provider` for key trends, anomalies, and correlations in
/// `records`, returning the model's prose.
///
/// # Errors
///
/// * [`AiError::NoData`] if `records` is empty; the provider is not called.
/// * [`AiError::EmptyResponse`] if the model replies with blank text.
/// * Any provider, HTTP, or serialization failure.
pub async fn generate_insights(
    provider: &dyn LlmProvider,
    records: &[Apprehension],
    options: &InsightOptions,
) -> Result<String, AiError> {
    if records.is_empty() {
        return Err(AiError::NoData);
    }

    let message = build_user_message(records, options.max_records)?;
    log::info!(
        "Requesting insights for {} of {} records",
        records.len().min(options.max_records),
        records.len()
    );

    let response = provider
        .chat(&system_prompt(&options.language), &[message])
        .await?;

    if response.stop_reason == StopReason::MaxTokens {
        log::warn!("Insight response was truncated at the token limit");
    }

    let text = response.text.trim();
    if text.is_empty() {
        return Err(AiError::EmptyResponse);
    }

    Ok(text.to_string())
}
