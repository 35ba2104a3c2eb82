// extractor/src/merge.rs
//! Reconciliation of table-derived and text-derived records.

use std::collections::HashMap;

use tracing::debug;

use crate::config::MergeStrategy;
use crate::schemas::AssetRecord;

/// Union `table` and `text` records, one record per Asset Name.
///
/// Records are compared on their trimmed, case-insensitive Asset Name. The
/// more complete record wins; on a tie the earlier one stays, so table-derived
/// records beat text-derived ones. Output keeps first-appearance order.
pub fn merge_records(
    table: Vec<AssetRecord>,
    text: Vec<AssetRecord>,
    strategy: MergeStrategy,
) -> Vec<AssetRecord> {
    let mut merged: Vec<AssetRecord> = Vec::with_capacity(table.len() + text.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in table.into_iter().chain(text) {
        let Some(key) = record.merge_key() else {
            continue;
        };

        let Some(&slot) = index.get(&key) else {
            index.insert(key, merged.len());
            merged.push(record);
            continue;
        };

        let current = &mut merged[slot];
        let (mut winner, loser) = if record.completeness() > current.completeness() {
            (record, current.clone())
        } else {
            (current.clone(), record)
        };
        if strategy == MergeStrategy::FieldWise {
            winner.fill_missing_from(&loser);
        }
        debug!(
            asset = key.as_str(),
            completeness = winner.completeness(),
            "reconciled duplicate asset"
        );
        *current = winner;
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{AssetField, FieldValue};

    fn sparse() -> AssetRecord {
        AssetRecord::new()
            .with(AssetField::AssetName, "Unit A")
            .with(AssetField::Filename, "lease1.pdf")
            .with(AssetField::Tenant, "Acme")
    }

    fn rich() -> AssetRecord {
        AssetRecord::new()
            .with(AssetField::AssetName, "unit a ")
            .with(AssetField::Filename, "lease1.pdf")
            .with(AssetField::City, "Cholet")
            .with(AssetField::Country, "France")
            .with(AssetField::Tenant, "Acme SA")
            .with(AssetField::Gla, 1200_i64)
            .with(AssetField::IpRent, "532849")
    }

    #[test]
    fn test_more_complete_record_wins() {
        let merged = merge_records(vec![sparse()], vec![rich()], MergeStrategy::CompletenessWins);
        assert_eq!(merged, vec![rich()]);
    }

    #[test]
    fn test_tie_keeps_table_record() {
        let text = sparse().with(AssetField::Tenant, "Other");
        let merged = merge_records(vec![sparse()], vec![text], MergeStrategy::CompletenessWins);
        assert_eq!(merged, vec![sparse()]);
    }

    #[test]
    fn test_different_names_are_both_kept_in_order() {
        let other = AssetRecord::new().with(AssetField::AssetName, "Unit B");
        let merged = merge_records(
            vec![sparse()],
            vec![other.clone()],
            MergeStrategy::CompletenessWins,
        );
        assert_eq!(merged, vec![sparse(), other]);
    }

    #[test]
    fn test_merge_with_itself_is_identity() {
        let set = vec![
            rich(),
            AssetRecord::new().with(AssetField::AssetName, "Unit B"),
        ];
        for strategy in [MergeStrategy::CompletenessWins, MergeStrategy::FieldWise] {
            assert_eq!(merge_records(set.clone(), set.clone(), strategy), set);
        }
    }

    #[test]
    fn test_field_wise_fills_gaps_from_loser() {
        let table = sparse().with(AssetField::Seller, "Vendor SCI");
        let merged = merge_records(vec![table], vec![rich()], MergeStrategy::FieldWise);

        assert_eq!(merged.len(), 1);
        let record = &merged[0];
        assert_eq!(record.get(AssetField::Tenant), Some(&FieldValue::Text("Acme SA".into())));
        assert_eq!(
            record.get(AssetField::Seller),
            Some(&FieldValue::Text("Vendor SCI".into()))
        );
        assert_eq!(record.completeness(), 8);
    }

    #[test]
    fn test_duplicates_within_one_pass_collapse() {
        let merged = merge_records(
            vec![sparse(), rich()],
            Vec::new(),
            MergeStrategy::CompletenessWins,
        );
        assert_eq!(merged, vec![rich()]);
    }
}
