#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter selection and derived view types for the apprehension dashboard.
//!
//! Everything here is recomputed from the base record set on every
//! selection change; none of it is stored.

use aprehensys_apprehension_models::Apprehension;
use serde::{Deserialize, Serialize};

/// Sentinel string meaning "match all" in query parameters and selector
/// option lists.
pub const ALL: &str = "all";

/// An equality predicate over one field, or "match all".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    /// Matches every record.
    #[default]
    All,
    /// Matches records whose field equals this value exactly.
    Only(String),
}

impl Selection {
    /// Builds a selection from an optional parameter; missing, blank, and
    /// [`ALL`] values select everything.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(ALL) => Self::All,
            Some(v) => Self::Only(v.to_string()),
        }
    }

    /// Whether this is the match-all selection.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Tests a field value against this selection.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == value,
        }
    }

    /// Tests an optional field value; an absent value only matches
    /// [`Selection::All`].
    #[must_use]
    pub fn matches_opt(&self, value: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => value == Some(expected.as_str()),
        }
    }

    /// Returns the parameter form ([`ALL`] or the selected value).
    #[must_use]
    pub fn as_param(&self) -> &str {
        match self {
            Self::All => ALL,
            Self::Only(value) => value,
        }
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        Self::from_param(Some(&value))
    }
}

impl From<Selection> for String {
    fn from(value: Selection) -> Self {
        value.as_param().to_string()
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_param())
    }
}

/// The three independent dashboard filters.
///
/// The commune filter is scoped to the selected municipality, so changing
/// the municipality through [`FilterSelection::select_municipality`] resets
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSelection {
    /// Municipality (region) filter.
    pub municipality: Selection,
    /// Commune (sub-region) filter.
    pub commune: Selection,
    /// Operation leader filter.
    pub leader: Selection,
}

impl FilterSelection {
    /// Builds a selection from raw parameter values.
    #[must_use]
    pub fn from_params(
        municipality: Option<&str>,
        commune: Option<&str>,
        leader: Option<&str>,
    ) -> Self {
        Self {
            municipality: Selection::from_param(municipality),
            commune: Selection::from_param(commune),
            leader: Selection::from_param(leader),
        }
    }

    /// Selects a municipality and resets the commune filter to match all.
    pub fn select_municipality(&mut self, municipality: Selection) {
        self.municipality = municipality;
        self.commune = Selection::All;
    }

    /// Selects a commune within the current municipality.
    pub fn select_commune(&mut self, commune: Selection) {
        self.commune = commune;
    }

    /// Selects an operation leader.
    pub fn select_leader(&mut self, leader: Selection) {
        self.leader = leader;
    }

    /// Whether `record` satisfies every active predicate.
    #[must_use]
    pub fn matches(&self, record: &Apprehension) -> bool {
        self.municipality.matches(&record.municipality)
            && self.commune.matches_opt(record.commune.as_deref())
            && self.leader.matches(&record.leader)
    }

    /// The map shows one point per municipality until a municipality is
    /// selected.
    #[must_use]
    pub const fn map_is_aggregated(&self) -> bool {
        self.municipality.is_all()
    }
}

/// Scalar summary statistics over a record sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Sum of commercial values.
    pub total_value: f64,
    /// Number of records.
    pub count: u64,
    /// `total_value / count`, or `0` for an empty sequence.
    pub average_value: f64,
    /// Number of distinct classification labels.
    pub distinct_classifications: u64,
}

/// Occurrence count for one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelCount {
    /// Label (classification, origin, ...).
    pub label: String,
    /// Number of records carrying it.
    pub count: u64,
}

/// A marker for the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPoint {
    /// Municipality for aggregated points, address for per-record points.
    pub label: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Summed commercial value of the records behind this point.
    pub total_value: f64,
    /// Number of records behind this point.
    pub count: u64,
    /// Classification of the record (per-record points only).
    pub classification: Option<String>,
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// Initial map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    /// Map center.
    pub center: LatLng,
    /// Slippy-map zoom level.
    pub zoom: u8,
}

/// Constants for deriving a [`MapView`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapDefaults {
    /// Center used when there are no points.
    pub fallback_center: LatLng,
    /// Zoom used when there are no points or every point coincides.
    pub fallback_zoom: u8,
    /// Zoom used for exactly one point.
    pub single_point_zoom: u8,
    /// Lower zoom bound.
    pub min_zoom: u8,
    /// Upper zoom bound.
    pub max_zoom: u8,
}

impl Default for MapDefaults {
    fn default() -> Self {
        Self {
            fallback_center: LatLng {
                lat: 7.8939,
                lng: -72.5078,
            },
            fallback_zoom: 10,
            single_point_zoom: 13,
            min_zoom: 0,
            max_zoom: 18,
        }
    }
}

/// Values for building the filter selectors. Each list begins with
/// [`ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Distinct municipalities.
    pub municipalities: Vec<String>,
    /// Distinct communes of the selected municipality (only [`ALL`] when
    /// no municipality is selected).
    pub communes: Vec<String>,
    /// Distinct operation leaders.
    pub leaders: Vec<String>,
}

/// Every derived view for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// The selection these views were computed for.
    pub selection: FilterSelection,
    /// Records matching the selection, in source order.
    pub records: Vec<Apprehension>,
    /// `false` when the selection matches nothing; list views show a
    /// "no results" message instead of a table.
    pub has_results: bool,
    /// Scalar statistics.
    pub stats: SummaryStats,
    /// Classification histogram, descending by count.
    pub by_classification: Vec<LabelCount>,
    /// Origin histogram, in encounter order.
    pub by_origin: Vec<LabelCount>,
    /// Whether `map_points` are per-municipality aggregates.
    pub map_aggregated: bool,
    /// Map markers.
    pub map_points: Vec<MapPoint>,
    /// Initial viewport fitted to `map_points`.
    pub map_view: MapView,
    /// Selector option lists.
    pub options: FilterOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_params() {
        assert_eq!(Selection::from_param(None), Selection::All);
        assert_eq!(Selection::from_param(Some("")), Selection::All);
        assert_eq!(Selection::from_param(Some(" all ")), Selection::All);
        assert_eq!(
            Selection::from_param(Some("CUCUTA")),
            Selection::Only("CUCUTA".to_string())
        );
        assert_eq!(Selection::Only("X".to_string()).as_param(), "X");
        assert_eq!(Selection::All.to_string(), ALL);
    }

    #[test]
    fn selecting_municipality_resets_commune() {
        let mut selection = FilterSelection::default();
        selection.select_municipality(Selection::Only("CUCUTA".to_string()));
        selection.select_commune(Selection::Only("3".to_string()));
        selection.select_leader(Selection::Only("POLFA".to_string()));

        selection.select_municipality(Selection::Only("OCAÑA".to_string()));

        assert_eq!(selection.commune, Selection::All);
        assert_eq!(selection.leader, Selection::Only("POLFA".to_string()));
        assert!(!selection.map_is_aggregated());
    }

    #[test]
    fn absent_commune_only_matches_all() {
        assert!(Selection::All.matches_opt(None));
        assert!(!Selection::Only("3".to_string()).matches_opt(None));
        assert!(Selection::Only("3".to_string()).matches_opt(Some("3")));
    }

    #[test]
    fn filter_selection_deserializes_with_defaults() {
        let selection: FilterSelection =
            serde_json::from_str(r#"{"municipality":"CUCUTA"}"#).unwrap();
        assert_eq!(selection.municipality, Selection::Only("CUCUTA".to_string()));
        assert_eq!(selection.commune, Selection::All);

        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(json["commune"], "all");
    }
}
