//! Source registry: the embedded default definition plus file and
//! environment overrides.
//!
//! The default `sources/apprehensions.toml` is baked into the binary at
//! compile time via [`include_str!`].

use std::path::Path;

use crate::SourceError;
use crate::source_def::{SourceDefinition, parse_source_toml};

/// Environment variable naming an alternative source TOML file.
pub const SOURCE_CONFIG_ENV: &str = "APREHENSYS_SOURCE_CONFIG";

/// Environment variable overriding the source URL.
pub const CSV_URL_ENV: &str = "APREHENSYS_CSV_URL";

const DEFAULT_SOURCE_TOML: &str = include_str!("../sources/apprehensions.toml");

/// Returns the embedded default source definition.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the embedded TOML is invalid.
pub fn default_source() -> Result<SourceDefinition, SourceError> {
    parse_source_toml(DEFAULT_SOURCE_TOML)
}

/// Reads a source definition from a TOML file on disk.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be read, or
/// [`SourceError::Config`] if it is not a valid definition.
pub fn load_source_file(path: &Path) -> Result<SourceDefinition, SourceError> {
    log::debug!("Reading source definition from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    parse_source_toml(&text)
}

/// Resolves the effective source definition.
///
/// Precedence, highest first: the explicit `config_path` / `url`
/// arguments, then [`SOURCE_CONFIG_ENV`] / [`CSV_URL_ENV`], then the
/// embedded default.
///
/// # Errors
///
/// Returns [`SourceError`] if a referenced file cannot be read or parsed.
pub fn resolve_source(
    config_path: Option<&Path>,
    url: Option<&str>,
) -> Result<SourceDefinition, SourceError> {
    let env_path = std::env::var(SOURCE_CONFIG_ENV).ok();
    let path = config_path.or_else(|| env_path.as_deref().map(Path::new));

    let definition = match path {
        Some(path) => load_source_file(path)?,
        None => default_source()?,
    };

    let url = url
        .map(str::to_string)
        .or_else(|| std::env::var(CSV_URL_ENV).ok());

    Ok(definition.with_url_override(url))
}
