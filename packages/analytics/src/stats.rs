//! Scalar summary statistics.

use std::collections::BTreeSet;

use aprehensys_analytics_models::SummaryStats;
use aprehensys_apprehension_models::Apprehension;

/// Computes total value, record count, average value, and the number of
/// distinct classifications. The average of an empty slice is `0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_stats(records: &[Apprehension]) -> SummaryStats {
    let total_value: f64 = records.iter().map(|r| r.commercial_value).sum();
    let count = records.len() as u64;
    let distinct: BTreeSet<&str> = records.iter().map(|r| r.classification.as_str()).collect();

    SummaryStats {
        total_value,
        count,
        average_value: if count == 0 {
            0.0
        } else {
            total_value / count as f64
        },
        distinct_classifications: distinct.len() as u64,
    }
}
