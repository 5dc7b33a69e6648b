//! Selector option lists.

use std::collections::BTreeSet;

use aprehensys_analytics_models::{ALL, FilterOptions, FilterSelection, Selection};
use aprehensys_apprehension_models::Apprehension;

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: BTreeSet<&str> = BTreeSet::from([ALL]);
    let mut out = vec![ALL.to_string()];
    for value in values {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    out
}

/// Builds the municipality, commune, and leader option lists from the full
/// record set.
///
/// Values are distinct in first-seen order, each list led by [`ALL`].
/// Communes are scoped to the selected municipality and collapse to just
/// [`ALL`] while no municipality is selected.
#[must_use]
pub fn filter_options(records: &[Apprehension], selection: &FilterSelection) -> FilterOptions {
    let communes = match &selection.municipality {
        Selection::All => vec![ALL.to_string()],
        Selection::Only(municipality) => distinct(
            records
                .iter()
                .filter(|r| &r.municipality == municipality)
                .filter_map(|r| r.commune.as_deref()),
        ),
    };

    FilterOptions {
        municipalities: distinct(records.iter().map(|r| r.municipality.as_str())),
        communes,
        leaders: distinct(records.iter().map(|r| r.leader.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    fn records() -> Vec<Apprehension> {
        let mut a = record("1", "CUCUTA", "A", 0.0);
        a.commune = Some("5".to_string());
        let mut b = record("2", "OCAÑA", "A", 0.0);
        b.commune = Some("9".to_string());
        b.leader = "DIAN".to_string();
        let mut c = record("3", "CUCUTA", "A", 0.0);
        c.commune = Some("2".to_string());
        let mut d = record("4", "CUCUTA", "A", 0.0);
        d.commune = Some("5".to_string());
        vec![a, b, c, d, record("5", "CUCUTA", "A", 0.0)]
    }

    #[test]
    fn lists_start_with_all_and_are_distinct() {
        let options = filter_options(&records(), &FilterSelection::default());

        assert_eq!(options.municipalities, ["all", "CUCUTA", "OCAÑA"]);
        assert_eq!(options.leaders, ["all", "POLFA", "DIAN"]);
        assert_eq!(options.communes, ["all"]);
    }

    #[test]
    fn communes_are_scoped_to_selected_municipality() {
        let selection = FilterSelection::from_params(Some("CUCUTA"), None, None);
        let options = filter_options(&records(), &selection);
        assert_eq!(options.communes, ["all", "5", "2"]);
    }

    #[test]
    fn empty_records_still_offer_all() {
        let options = filter_options(&[], &FilterSelection::default());
        assert_eq!(options.municipalities, ["all"]);
        assert_eq!(options.leaders, ["all"]);
    }
}
