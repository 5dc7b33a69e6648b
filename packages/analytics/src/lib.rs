#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation engine over normalized apprehension records.
//!
//! Every function here is pure: it takes the authoritative record slice
//! plus a [`FilterSelection`] and builds fresh derived views. Empty input
//! is not an error; it yields zero-valued stats, empty histograms, and the
//! fallback map view.

pub mod filter;
pub mod histogram;
pub mod map;
pub mod options;
pub mod stats;

use aprehensys_analytics_models::{Dashboard, FilterSelection, MapDefaults};
use aprehensys_apprehension_models::Apprehension;

pub use filter::filter;
pub use histogram::{by_classification, by_origin};
pub use map::{cluster_for_map, map_view};
pub use options::filter_options;
pub use stats::compute_stats;

/// Computes every derived view for `selection` in one pass over the
/// filtered records.
#[must_use]
pub fn build_dashboard(
    records: &[Apprehension],
    selection: &FilterSelection,
    map_defaults: &MapDefaults,
) -> Dashboard {
    let filtered = filter(records, selection);
    let aggregated = selection.map_is_aggregated();
    let map_points = cluster_for_map(&filtered, aggregated);
    let map_view = map_view(&map_points, map_defaults);

    log::debug!(
        "Dashboard for municipality={} commune={} leader={}: {} of {} records, {} map points",
        selection.municipality,
        selection.commune,
        selection.leader,
        filtered.len(),
        records.len(),
        map_points.len(),
    );

    Dashboard {
        selection: selection.clone(),
        has_results: !filtered.is_empty(),
        stats: compute_stats(&filtered),
        by_classification: by_classification(&filtered),
        by_origin: by_origin(&filtered),
        map_aggregated: aggregated,
        map_points,
        map_view,
        options: filter_options(records, selection),
        records: filtered,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use aprehensys_apprehension_models::Apprehension;
    use chrono::NaiveDate;

    pub fn record(id: &str, municipality: &str, classification: &str, value: f64) -> Apprehension {
        Apprehension {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            municipality: municipality.to_string(),
            commune: None,
            address: format!("Calle {id}"),
            classification: classification.to_string(),
            sector: String::new(),
            origin: "PUESTO DE CONTROL".to_string(),
            commercial_value: value,
            lat: 7.9,
            lng: -72.5,
            leader: "POLFA".to_string(),
        }
    }
}
