//! Cell-level coercion helpers.
//!
//! Every function here is total: bad input maps to a defined default (or
//! `None` where the caller decides), never to an error.

use std::sync::LazyLock;

use aprehensys_apprehension_models::MunicipalityAlias;
use chrono::NaiveDate;
use regex::Regex;

static ISO_DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}").unwrap_or_else(|_| unreachable!()));

/// Parses a source date into a calendar date.
///
/// Accepts `D/M/YY` and `D/M/YYYY` (years below 100 are taken as 20YY)
/// and strings that start with an ISO `YYYY-MM-DD` date, ignoring any
/// trailing time component. Anything else, including impossible dates
/// such as `31/02/24`, yields `fallback`.
#[must_use]
pub fn parse_date(raw: &str, fallback: NaiveDate) -> NaiveDate {
    let raw = raw.trim();
    if raw.is_empty() {
        return fallback;
    }

    if let Some(date) = parse_day_month_year(raw) {
        return date;
    }

    if let Some(prefix) = ISO_DATE_PREFIX.find(raw)
        && let Ok(date) = NaiveDate::parse_from_str(prefix.as_str(), "%Y-%m-%d")
    {
        return date;
    }

    fallback
}

fn parse_day_month_year(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.split('/').collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };

    let day: u32 = day.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let year: i32 = year.trim().parse().ok()?;
    let year = if (0..100).contains(&year) {
        2000 + year
    } else {
        year
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses a non-negative decimal value, substituting `0.0` for anything
/// missing, unparsable, non-finite, or negative.
#[must_use]
pub fn parse_commercial_value(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

/// Parses one coordinate. Returns `None` if missing, unparsable, or not
/// finite.
#[must_use]
pub fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalizes a municipality name: trims, upper-cases, and rewrites known
/// alternate spellings via `aliases` (first matching prefix wins).
///
/// Idempotent as long as every alias's canonical form begins with its own
/// prefix.
#[must_use]
pub fn normalize_municipality(raw: &str, aliases: &[MunicipalityAlias]) -> String {
    let upper = raw.trim().to_uppercase();

    let alias = aliases.iter().find(|alias| {
        let prefix = alias.prefix.trim().to_uppercase();
        !prefix.is_empty() && upper.starts_with(prefix.as_str())
    });

    match alias {
        Some(alias) => alias.canonical.clone(),
        None => upper,
    }
}

/// Returns the trimmed cell, or `None` if it is missing or blank.
#[must_use]
pub fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Returns the trimmed cell, or `default` if it is missing or blank.
#[must_use]
pub fn text_or(raw: Option<&str>, default: &str) -> String {
    non_blank(raw).unwrap_or(default).to_string()
}
