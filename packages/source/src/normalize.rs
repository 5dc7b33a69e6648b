//! Ingestion normalizer: raw rows in, admitted [`Apprehension`]s out.
//!
//! Each row is first coerced into a [`Candidate`] (every field gets a value
//! or a defined default), then checked against [`ADMISSION_RULES`] in order.
//! The first rule a candidate fails names the [`RejectReason`]; candidates
//! that pass every rule become records. Source order is preserved.

use std::collections::BTreeMap;

use aprehensys_apprehension_models::{Apprehension, NormalizerDefaults, RejectReason, Rejection};

use crate::RawRow;
use crate::parsing::{
    non_blank, normalize_municipality, parse_commercial_value, parse_coordinate, parse_date,
    text_or,
};
use crate::source_def::ColumnMapping;

/// A coerced row that has not yet been admitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Record fields, with `lat`/`lng` left as `0.0` until admission
    /// confirms the coordinates below.
    pub record: Apprehension,
    /// Whether the municipality is the unknown sentinel (or was blank).
    pub unknown_municipality: bool,
    /// Parsed coordinates, `None` if either was missing or unparsable.
    pub coordinates: Option<(f64, f64)>,
}

/// A named admission predicate.
pub struct AdmissionRule {
    /// Reason reported when `admits` returns `false`.
    pub reason: RejectReason,
    /// Returns `true` if the candidate passes this rule.
    pub admits: fn(&Candidate) -> bool,
}

/// Admission predicates, evaluated in order.
#[allow(clippy::float_cmp)]
pub const ADMISSION_RULES: &[AdmissionRule] = &[
    AdmissionRule {
        reason: RejectReason::MissingId,
        admits: |c| !c.record.id.is_empty(),
    },
    AdmissionRule {
        reason: RejectReason::UnknownMunicipality,
        admits: |c| !c.unknown_municipality,
    },
    AdmissionRule {
        reason: RejectReason::InvalidCoordinates,
        admits: |c| c.coordinates.is_some(),
    },
    AdmissionRule {
        reason: RejectReason::ZeroCoordinates,
        admits: |c| !matches!(c.coordinates, Some((lat, lng)) if lat == 0.0 && lng == 0.0),
    },
];

/// Output of [`normalize_with_report`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Admitted records in source order.
    pub records: Vec<Apprehension>,
    /// Rows that failed admission, in source order.
    pub rejections: Vec<Rejection>,
}

impl Normalized {
    /// Counts rejections by reason. Every reason is present, zero if unused.
    #[must_use]
    pub fn rejection_counts(&self) -> BTreeMap<RejectReason, usize> {
        let mut counts: BTreeMap<RejectReason, usize> =
            RejectReason::all().iter().map(|r| (*r, 0)).collect();
        for rejection in &self.rejections {
            *counts.entry(rejection.reason).or_default() += 1;
        }
        counts
    }
}

/// Looks up a cell by header name, tolerating surrounding whitespace on
/// either the header key or the configured name.
fn cell<'a>(row: &'a RawRow, column: &str) -> Option<&'a str> {
    let column = column.trim();
    row.get(column)
        .or_else(|| {
            row.iter()
                .find(|(key, _)| key.trim() == column)
                .map(|(_, value)| value)
        })
        .map(String::as_str)
}

/// Coerces a raw row into a [`Candidate`]. Never fails.
#[must_use]
pub fn coerce(row: &RawRow, columns: &ColumnMapping, defaults: &NormalizerDefaults) -> Candidate {
    let get = |column: &str| cell(row, column);

    let municipality = normalize_municipality(
        non_blank(get(&columns.municipality)).unwrap_or(defaults.unknown.as_str()),
        &defaults.municipality_aliases,
    );
    let unknown_municipality =
        municipality.is_empty() || municipality == defaults.unknown_municipality();

    let coordinates = parse_coordinate(get(&columns.latitude))
        .zip(parse_coordinate(get(&columns.longitude)));

    let record = Apprehension {
        id: non_blank(get(&columns.id)).unwrap_or_default().to_string(),
        date: parse_date(get(&columns.date).unwrap_or_default(), defaults.fallback_date),
        municipality,
        commune: non_blank(get(&columns.commune)).map(str::to_string),
        address: text_or(get(&columns.address), ""),
        classification: text_or(get(&columns.classification), &defaults.other_classification),
        sector: text_or(get(&columns.sector), ""),
        origin: text_or(get(&columns.origin), &defaults.unknown),
        commercial_value: parse_commercial_value(get(&columns.commercial_value)),
        lat: coordinates.map_or(0.0, |(lat, _)| lat),
        lng: coordinates.map_or(0.0, |(_, lng)| lng),
        leader: text_or(get(&columns.leader), &defaults.unknown),
    };

    Candidate {
        record,
        unknown_municipality,
        coordinates,
    }
}

/// Runs the admission rules against a candidate.
///
/// # Errors
///
/// Returns the [`RejectReason`] of the first rule the candidate fails.
pub fn admit(candidate: Candidate) -> Result<Apprehension, RejectReason> {
    match ADMISSION_RULES.iter().find(|rule| !(rule.admits)(&candidate)) {
        Some(rule) => Err(rule.reason),
        None => Ok(candidate.record),
    }
}

/// Normalizes raw rows, reporting why each dropped row was dropped.
#[must_use]
pub fn normalize_with_report(
    rows: &[RawRow],
    columns: &ColumnMapping,
    defaults: &NormalizerDefaults,
) -> Normalized {
    let mut normalized = Normalized::default();

    for (row_index, row) in rows.iter().enumerate() {
        match admit(coerce(row, columns, defaults)) {
            Ok(record) => normalized.records.push(record),
            Err(reason) => {
                log::trace!("Dropping row {row_index}: {reason}");
                normalized.rejections.push(Rejection { row_index, reason });
            }
        }
    }

    normalized
}

/// Normalizes raw rows into admitted records, silently dropping the rest.
#[must_use]
pub fn normalize(
    rows: &[RawRow],
    columns: &ColumnMapping,
    defaults: &NormalizerDefaults,
) -> Vec<Apprehension> {
    normalize_with_report(rows, columns, defaults).records
}
