//! CSV download and structural parsing.
//!
//! Downloads the published export in one request and turns it into
//! [`RawRow`]s keyed by the trimmed column headers of the first row.

use std::collections::BTreeMap;

use crate::source_def::SourceDefinition;
use crate::{RawRow, SourceError};

/// One-shot downloader for a delimited-text export.
#[derive(Debug, Clone)]
pub struct CsvDownload {
    /// URL of the file to download.
    url: String,
    /// Additional HTTP headers for the download request.
    headers: BTreeMap<String, String>,
    /// Field delimiter byte (defaults to `,`).
    delimiter: u8,
}

impl CsvDownload {
    /// Creates a downloader for `url` with default settings
    /// (comma-delimited, no extra headers).
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            headers: BTreeMap::new(),
            delimiter: b',',
        }
    }

    /// Builds a downloader from a source definition.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if the definition has no URL.
    pub fn from_definition(definition: &SourceDefinition) -> Result<Self, SourceError> {
        let mut download =
            Self::new(definition.require_url()?).with_delimiter(definition.delimiter_byte());
        for (key, value) in &definition.headers {
            download = download.with_header(key, value);
        }
        Ok(download)
    }

    /// Sets the field delimiter (e.g. `b';'`).
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Adds an HTTP header to include in the download request.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Returns the URL this downloader fetches.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_client(&self) -> Result<reqwest::Client, SourceError> {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in &self.headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                SourceError::Config {
                    message: format!("invalid header name '{key}': {e}"),
                }
            })?;
            let val =
                reqwest::header::HeaderValue::from_str(value).map_err(|e| SourceError::Config {
                    message: format!("invalid header value '{value}': {e}"),
                })?;
            header_map.insert(name, val);
        }
        Ok(reqwest::Client::builder()
            .default_headers(header_map)
            .build()?)
    }

    /// Downloads the document and parses it into raw rows.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails, the server answers
    /// with a non-success status, or the document has no header row.
    pub async fn fetch(&self) -> Result<Vec<RawRow>, SourceError> {
        let client = self.build_client()?;
        let response = client.get(&self.url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        log::debug!("Downloaded {} bytes from {}", bytes.len(), self.url);

        let rows = parse_csv(&bytes, self.delimiter).map_err(|e| match e {
            SourceError::EmptyDocument { .. } => SourceError::EmptyDocument {
                url: self.url.clone(),
            },
            other => other,
        })?;

        log::info!("Parsed {} rows from CSV at {}", rows.len(), self.url);

        Ok(rows)
    }
}

/// Parses delimited text into rows keyed by trimmed header.
///
/// Blank lines are skipped. Rows shorter than the header get empty strings
/// for the missing cells; extra cells are ignored. A row that cannot be
/// decoded is logged and skipped rather than failing the document.
///
/// # Errors
///
/// Returns [`SourceError::EmptyDocument`] if there is no header row, or
/// [`SourceError::Csv`] if the header itself cannot be read.
pub fn parse_csv(bytes: &[u8], delimiter: u8) -> Result<Vec<RawRow>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(SourceError::EmptyDocument {
            url: String::new(),
        });
    }

    let mut rows = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping malformed CSV row {index}: {e}");
                continue;
            }
        };

        let row: RawRow = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.is_empty())
            .map(|(i, header)| {
                let value = record.get(i).unwrap_or("").trim().to_owned();
                (header.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok(rows)
}
