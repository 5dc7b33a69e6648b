#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Apprehension record type and ingestion defaults.
//!
//! This crate defines the canonical [`Apprehension`] record produced by the
//! ingestion normalizer and consumed by every downstream view. It also holds
//! the named fallback constants ([`NormalizerDefaults`]) and the reason codes
//! ([`RejectReason`]) attached to rows that fail admission.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Fallback date used when the source date cell cannot be parsed.
pub const DEFAULT_FALLBACK_DATE: &str = "2024-01-01";

/// Placeholder used for absent municipality, origin and leader values.
pub const DEFAULT_UNKNOWN: &str = "Desconocido";

/// Placeholder used for an absent classification.
pub const DEFAULT_OTHER_CLASSIFICATION: &str = "OTROS";

/// A single apprehension admitted into the working set.
///
/// Records are immutable once produced; filtering always builds new
/// sequences rather than editing these in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apprehension {
    /// Source row identifier. Never empty.
    pub id: String,
    /// Date of the apprehension record (serialized as `YYYY-MM-DD`).
    pub date: NaiveDate,
    /// Normalized, upper-cased municipality. Never the unknown sentinel.
    pub municipality: String,
    /// Commune within the municipality, when the source provides one.
    pub commune: Option<String>,
    /// Free-text street address. May be empty.
    pub address: String,
    /// Classification label of the seized goods.
    pub classification: String,
    /// Free-text description / sector.
    pub sector: String,
    /// Origin of the apprehension.
    pub origin: String,
    /// Commercial value of the seized goods. Always `>= 0`.
    pub commercial_value: f64,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Leader of the operation.
    pub leader: String,
}

/// Rewrites any municipality beginning with `prefix` to `canonical`.
///
/// Handles sources that spell the same city several ways.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunicipalityAlias {
    /// Upper-case prefix to match after trimming and upper-casing.
    pub prefix: String,
    /// Canonical spelling substituted for any match.
    pub canonical: String,
}

/// Named fallback constants applied during ingestion.
///
/// Passed explicitly into the normalizer so callers (and tests) can
/// override any of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct NormalizerDefaults {
    /// Date substituted when the source date is missing or unparsable.
    pub fallback_date: NaiveDate,
    /// Sentinel for absent municipality, origin and leader.
    pub unknown: String,
    /// Sentinel for an absent classification.
    pub other_classification: String,
    /// Municipality spelling fixes, applied in order; first match wins.
    pub municipality_aliases: Vec<MunicipalityAlias>,
}

impl NormalizerDefaults {
    /// The unknown sentinel in normalized (trimmed, upper-case) form, as it
    /// would appear in a municipality field.
    #[must_use]
    pub fn unknown_municipality(&self) -> String {
        self.unknown.trim().to_uppercase()
    }
}

impl Default for NormalizerDefaults {
    fn default() -> Self {
        Self {
            fallback_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            unknown: DEFAULT_UNKNOWN.to_string(),
            other_classification: DEFAULT_OTHER_CLASSIFICATION.to_string(),
            municipality_aliases: vec![MunicipalityAlias {
                prefix: "PAMPLONA".to_string(),
                canonical: "PAMPLONA COLOMBIA".to_string(),
            }],
        }
    }
}

/// Why a raw row was kept out of the working set.
///
/// Admission predicates are evaluated in declaration order and the first
/// failure is reported.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// The id cell is absent or blank.
    MissingId,
    /// The municipality is absent, blank, or the unknown sentinel.
    UnknownMunicipality,
    /// Latitude or longitude is absent, unparsable, or not finite.
    InvalidCoordinates,
    /// Latitude and longitude are both exactly zero.
    ZeroCoordinates,
}

impl RejectReason {
    /// Returns all variants in evaluation order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::MissingId,
            Self::UnknownMunicipality,
            Self::InvalidCoordinates,
            Self::ZeroCoordinates,
        ]
    }
}

/// A raw row that failed admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    /// Zero-based position of the row in the normalizer input.
    pub row_index: usize,
    /// First admission predicate the row failed.
    pub reason: RejectReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fallback_date_matches_constant() {
        let defaults = NormalizerDefaults::default();
        assert_eq!(defaults.fallback_date.to_string(), DEFAULT_FALLBACK_DATE);
    }

    #[test]
    fn unknown_municipality_is_uppercased() {
        let defaults = NormalizerDefaults::default();
        assert_eq!(defaults.unknown_municipality(), "DESCONOCIDO");
    }

    #[test]
    fn reject_reason_string_roundtrip() {
        for reason in RejectReason::all() {
            let parsed: RejectReason = reason.as_ref().parse().unwrap();
            assert_eq!(parsed, *reason);
        }
        assert_eq!(RejectReason::MissingId.to_string(), "MISSING_ID");
    }

    #[test]
    fn apprehension_serializes_camel_case_with_iso_date() {
        let record = Apprehension {
            id: "1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            municipality: "CUCUTA".to_string(),
            commune: None,
            address: String::new(),
            classification: "OTROS".to_string(),
            sector: String::new(),
            origin: "Desconocido".to_string(),
            commercial_value: 10.0,
            lat: 7.89,
            lng: -72.5,
            leader: "Desconocido".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2024-03-05");
        assert_eq!(json["commercialValue"], 10.0);
        assert!(json["commune"].is_null());
    }
}
