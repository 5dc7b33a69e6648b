//! Config-driven source definition.
//!
//! [`SourceDefinition`] captures everything deployment-specific about the
//! upstream spreadsheet export: where to download it, how it is delimited,
//! which header names carry which fields, and the fallback constants the
//! normalizer substitutes for missing data.

use std::collections::BTreeMap;

use aprehensys_apprehension_models::NormalizerDefaults;
use serde::{Deserialize, Serialize};

use crate::SourceError;

/// A complete apprehension source definition, usually loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Unique identifier used in log messages (e.g. `"apprehensions"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// URL of the published delimited-text export.
    #[serde(default)]
    pub url: Option<String>,
    /// Field delimiter. Only the first byte is used.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Additional HTTP headers for the download request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Header names for each record field.
    #[serde(default)]
    pub columns: ColumnMapping,
    /// Fallback constants for the normalizer.
    #[serde(default)]
    pub defaults: NormalizerDefaults,
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl SourceDefinition {
    /// Returns the delimiter as a single byte, defaulting to `,` when the
    /// configured value is empty.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }

    /// Replaces the configured URL when `url` is `Some`.
    #[must_use]
    pub fn with_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.url = Some(url);
        }
        self
    }

    /// Returns the configured URL.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] when no URL has been configured.
    pub fn require_url(&self) -> Result<&str, SourceError> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| SourceError::Config {
                message: format!(
                    "source '{}' has no url; set APREHENSYS_CSV_URL or pass --url",
                    self.id
                ),
            })
    }
}

/// Upstream header name for each [`Apprehension`] field.
///
/// These names are a fixed contract with the upstream document; the
/// defaults match the published sheet.
///
/// [`Apprehension`]: aprehensys_apprehension_models::Apprehension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Record identifier.
    pub id: String,
    /// Record date (`DD/MM/YY`, `DD/MM/YYYY`, or ISO).
    pub date: String,
    /// Municipality.
    pub municipality: String,
    /// Commune.
    pub commune: String,
    /// Street address.
    pub address: String,
    /// Classification label.
    pub classification: String,
    /// Description / sector.
    pub sector: String,
    /// Origin of the apprehension.
    pub origin: String,
    /// Commercial value.
    pub commercial_value: String,
    /// Latitude.
    pub latitude: String,
    /// Longitude.
    pub longitude: String,
    /// Operation leader.
    pub leader: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: "ID_DetalleAprehension".to_string(),
            date: "FechaActa".to_string(),
            municipality: "Municipio".to_string(),
            commune: "ComunaID".to_string(),
            address: "Direccion".to_string(),
            classification: "Clasificacion".to_string(),
            sector: "Descripcion".to_string(),
            origin: "OrigenAprehension".to_string(),
            commercial_value: "ValorComercial".to_string(),
            latitude: "Latitude".to_string(),
            longitude: "Longitude".to_string(),
            leader: "LiderOperativo".to_string(),
        }
    }
}

/// Parses a [`SourceDefinition`] from a TOML string.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the TOML is malformed or missing
/// required fields.
pub fn parse_source_toml(toml_str: &str) -> Result<SourceDefinition, SourceError> {
    toml::de::from_str(toml_str).map_err(|e| SourceError::Config {
        message: e.to_string(),
    })
}
