#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the apprehension dashboard server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the analytics view types to allow independent evolution of the API
//! contract.

use aprehensys_analytics_models::FilterSelection;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Lifecycle of the in-memory record set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoadState {
    /// The one-shot load is still running.
    Loading,
    /// Records are available.
    Ready,
    /// The load failed; the session has no data.
    Failed,
}

/// Dataset status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    /// Current load state.
    pub state: LoadState,
    /// Admitted record count (zero unless ready).
    pub record_count: usize,
    /// Rows rejected during normalization (zero unless ready).
    pub rejected_count: usize,
    /// User-facing failure message when the load failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Query parameters for the dashboard endpoint. Absent values and the
/// literal `all` match every record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQueryParams {
    /// Municipality filter.
    pub municipality: Option<String>,
    /// Commune filter.
    pub commune: Option<String>,
    /// Operation leader filter.
    pub leader: Option<String>,
}

impl From<&DashboardQueryParams> for FilterSelection {
    fn from(p: &DashboardQueryParams) -> Self {
        Self::from_params(
            p.municipality.as_deref(),
            p.commune.as_deref(),
            p.leader.as_deref(),
        )
    }
}

/// Query parameters for the filter options endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersQueryParams {
    /// Selected municipality; scopes the commune list.
    pub municipality: Option<String>,
}

impl From<&FiltersQueryParams> for FilterSelection {
    fn from(p: &FiltersQueryParams) -> Self {
        Self::from_params(p.municipality.as_deref(), None, None)
    }
}

/// Body of an insight request: the filter selection whose records are
/// analyzed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InsightsRequest {
    /// Records matching this selection are sent to the model.
    #[serde(flatten)]
    pub selection: FilterSelection,
}

/// Generated insight prose.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsResponse {
    /// Model output, returned verbatim.
    pub insights: String,
    /// Records matching the selection.
    pub record_count: usize,
    /// Records actually sent to the model.
    pub sampled_count: usize,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// User-facing message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use aprehensys_analytics_models::Selection;

    use super::*;

    #[test]
    fn dashboard_params_map_to_selection() {
        let params = DashboardQueryParams {
            municipality: Some("CUCUTA".to_string()),
            commune: Some("all".to_string()),
            leader: None,
        };
        let selection = FilterSelection::from(&params);
        assert_eq!(selection.municipality, Selection::Only("CUCUTA".to_string()));
        assert_eq!(selection.commune, Selection::All);
        assert_eq!(selection.leader, Selection::All);
    }

    #[test]
    fn insights_request_reads_flat_selection() {
        let request: InsightsRequest =
            serde_json::from_str(r#"{"municipality":"OCAÑA","leader":"DIAN"}"#).unwrap();
        assert_eq!(
            request.selection.municipality,
            Selection::Only("OCAÑA".to_string())
        );
        assert_eq!(request.selection.leader, Selection::Only("DIAN".to_string()));

        let empty: InsightsRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.selection, FilterSelection::default());
    }

    #[test]
    fn status_omits_absent_error() {
        let status = ApiStatus {
            state: LoadState::Loading,
            record_count: 0,
            rejected_count: 0,
            error: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "loading");
        assert!(json.get("error").is_none());
        assert_eq!(LoadState::Failed.to_string(), "failed");
    }
}
