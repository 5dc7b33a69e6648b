#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Apprehension data source and ingestion normalizer.
//!
//! A [`SourceDefinition`](source_def::SourceDefinition) describes where the
//! published spreadsheet export lives and how its columns map onto
//! [`Apprehension`] fields. [`load`] downloads the document once, parses it
//! into raw rows, and runs the [`normalize`] pipeline over them.

pub mod csv_download;
pub mod normalize;
pub mod parsing;
pub mod registry;
pub mod source_def;

use std::collections::BTreeMap;

use aprehensys_apprehension_models::Apprehension;

use crate::csv_download::CsvDownload;
use crate::normalize::Normalized;
use crate::source_def::SourceDefinition;

/// A raw data row keyed by trimmed column header.
pub type RawRow = BTreeMap<String, String>;

/// Errors that can occur while loading a data source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The delimited text could not be read at the document level.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (reading a local source definition).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document has no header row.
    #[error("Document at {url} has no header row")]
    EmptyDocument {
        /// Where the document came from.
        url: String,
    },

    /// The source definition is missing something required.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Downloads the source document and normalizes it into apprehension
/// records.
///
/// This is the single one-shot load for a session: there is no retry and
/// any transport or document-level failure is returned as one error.
/// Individual rows that fail admission are reported in the returned
/// [`Normalized::rejections`] and never surface as errors.
///
/// # Errors
///
/// Returns [`SourceError`] if the definition has no URL, the download
/// fails, or the document cannot be parsed at all.
pub async fn load(definition: &SourceDefinition) -> Result<Normalized, SourceError> {
    let download = CsvDownload::from_definition(definition)?;
    let rows = download.fetch().await?;

    let normalized =
        normalize::normalize_with_report(&rows, &definition.columns, &definition.defaults);
    log_report(&definition.id, rows.len(), &normalized);

    Ok(normalized)
}

/// Convenience wrapper around [`load`] that discards the rejection report.
///
/// # Errors
///
/// See [`load`].
pub async fn load_apprehensions(
    definition: &SourceDefinition,
) -> Result<Vec<Apprehension>, SourceError> {
    Ok(load(definition).await?.records)
}

fn log_report(source_id: &str, total_rows: usize, normalized: &Normalized) {
    log::info!(
        "[{source_id}] admitted {}/{total_rows} rows",
        normalized.records.len()
    );

    for (reason, count) in normalized.rejection_counts() {
        if count > 0 {
            log::info!("[{source_id}] dropped {count} rows: {reason}");
        }
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serves exactly one HTTP response on a loopback port and returns the
    /// URL to request it from.
    pub fn serve_once(status: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
        });

        format!("http://{addr}/apprehensions.csv")
    }
}
