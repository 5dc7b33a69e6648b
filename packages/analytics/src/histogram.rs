//! Label histograms for the classification and origin charts.

use std::collections::BTreeMap;

use aprehensys_analytics_models::LabelCount;
use aprehensys_apprehension_models::Apprehension;

/// Counts labels in first-encounter order.
fn count_by<'a>(
    records: &'a [Apprehension],
    label: impl Fn(&'a Apprehension) -> &'a str,
) -> Vec<LabelCount> {
    let mut counts: Vec<LabelCount> = Vec::new();
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        let key = label(record);
        if let Some(&i) = index.get(key) {
            counts[i].count += 1;
        } else {
            index.insert(key, counts.len());
            counts.push(LabelCount {
                label: key.to_string(),
                count: 1,
            });
        }
    }
    counts
}

/// Classification histogram sorted by descending count. Ties keep the
/// order in which the labels were first seen.
#[must_use]
pub fn by_classification(records: &[Apprehension]) -> Vec<LabelCount> {
    let mut counts = count_by(records, |r| r.classification.as_str());
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Origin histogram in first-encounter order.
#[must_use]
pub fn by_origin(records: &[Apprehension]) -> Vec<LabelCount> {
    count_by(records, |r| r.origin.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    fn pairs(counts: &[LabelCount]) -> Vec<(&str, u64)> {
        counts.iter().map(|c| (c.label.as_str(), c.count)).collect()
    }

    #[test]
    fn interleaved_origins_keep_first_seen_order() {
        let mut records: Vec<_> = (0..300)
            .map(|i| record(&i.to_string(), "X", "A", 0.0))
            .collect();
        for (i, r) in records.iter_mut().enumerate() {
            r.origin = ["PUERTO", "CARRETERA", "AEROPUERTO"][i % 3].to_string();
        }

        assert_eq!(
            pairs(&by_origin(&records)),
            [("PUERTO", 100), ("CARRETERA", 100), ("AEROPUERTO", 100)]
        );
    }

    #[test]
    fn classification_is_sorted_descending() {
        let records = vec![
            record("1", "X", "A", 100.0),
            record("2", "X", "A", 200.0),
            record("3", "X", "B", 300.0),
        ];
        assert_eq!(pairs(&by_classification(&records)), [("A", 2), ("B", 1)]);

        let records = vec![
            record("1", "X", "B", 0.0),
            record("2", "X", "A", 0.0),
            record("3", "X", "A", 0.0),
        ];
        assert_eq!(pairs(&by_classification(&records)), [("A", 2), ("B", 1)]);
    }

    #[test]
    fn classification_ties_keep_encounter_order() {
        let records = vec![
            record("1", "X", "C", 0.0),
            record("2", "X", "A", 0.0),
            record("3", "X", "B", 0.0),
        ];
        assert_eq!(
            pairs(&by_classification(&records)),
            [("C", 1), ("A", 1), ("B", 1)]
        );
    }

    #[test]
    fn origin_keeps_encounter_order() {
        let mut a = record("1", "X", "A", 0.0);
        a.origin = "RETEN".to_string();
        let b = record("2", "X", "A", 0.0);
        let mut c = record("3", "X", "A", 0.0);
        c.origin = "RETEN".to_string();

        assert_eq!(
            pairs(&by_origin(&[a, b, c])),
            [("RETEN", 2), ("PUESTO DE CONTROL", 1)]
        );
    }

    #[test]
    fn counts_sum_to_record_count() {
        let records: Vec<_> = (0..7)
            .map(|i| record(&i.to_string(), "X", ["A", "B", "C"][i % 3], 0.0))
            .collect();
        let total: u64 = by_classification(&records).iter().map(|c| c.count).sum();
        assert_eq!(total, 7);
        assert!(by_origin(&[]).is_empty());
    }
}
