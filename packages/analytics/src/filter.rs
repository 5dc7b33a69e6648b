//! Record filtering by the active selection.

use aprehensys_analytics_models::FilterSelection;
use aprehensys_apprehension_models::Apprehension;

/// Returns the records matching every active predicate of `selection`,
/// in their original order.
///
/// Applying the same selection to its own output returns the same
/// sequence.
#[must_use]
pub fn filter(records: &[Apprehension], selection: &FilterSelection) -> Vec<Apprehension> {
    records
        .iter()
        .filter(|record| selection.matches(record))
        .cloned()
        .collect()
}
