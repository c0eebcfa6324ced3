use super::{SpendSummary, aggregate_spend, spend_frame};
use crate::error::Result;
use crate::records::{ActivityEventTable, ActivityPaymentTable};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

pub type ActivitySpendSummary = SpendSummary;

pub const ACTIVITY_SPEND_COLUMNS: [&str; 4] = [
    "TRAVEL_ID",
    "activity_payment_sum",
    "activity_payment_count",
    "activity_store_count",
];

pub const ACTIVITY_HISTORY_COLUMNS: [&str; 3] =
    ["TRAVEL_ID", "activity_history_rows", "activity_type_unique"];

/// Activity payments per trip.
pub fn aggregate_activity_spend(table: &ActivityPaymentTable) -> Vec<ActivitySpendSummary> {
    aggregate_spend(
        table
            .rows
            .iter()
            .map(|row| (row.travel_id.as_str(), row.amount, row.store_name.as_deref())),
    )
}

pub fn activity_spend_frame(summaries: &[ActivitySpendSummary]) -> Result<DataFrame> {
    spend_frame(summaries, &ACTIVITY_SPEND_COLUMNS)
}

/// Logged activities of one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityHistorySummary {
    pub travel_id: String,
    pub history_rows: i64,
    /// Distinct non-null activity type codes
    pub type_unique: i64,
}

pub fn aggregate_activity_history(table: &ActivityEventTable) -> Vec<ActivityHistorySummary> {
    let mut groups: BTreeMap<&str, (i64, BTreeSet<&str>)> = BTreeMap::new();
    for row in &table.rows {
        let (rows, types) = groups.entry(row.travel_id.as_str()).or_default();
        *rows += 1;
        if let Some(activity_type) = row.activity_type.as_deref() {
            types.insert(activity_type);
        }
    }

    groups
        .into_iter()
        .map(|(travel_id, (history_rows, types))| ActivityHistorySummary {
            travel_id: travel_id.to_string(),
            history_rows,
            type_unique: types.len() as i64,
        })
        .collect()
}

pub fn activity_history_frame(summaries: &[ActivityHistorySummary]) -> Result<DataFrame> {
    let ids: Vec<&str> = summaries.iter().map(|s| s.travel_id.as_str()).collect();
    let rows: Vec<i64> = summaries.iter().map(|s| s.history_rows).collect();
    let types: Vec<i64> = summaries.iter().map(|s| s.type_unique).collect();

    let df = DataFrame::new(vec![
        Column::new(ACTIVITY_HISTORY_COLUMNS[0].into(), ids),
        Column::new(ACTIVITY_HISTORY_COLUMNS[1].into(), rows),
        Column::new(ACTIVITY_HISTORY_COLUMNS[2].into(), types),
    ])?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column_names;

    #[test]
    fn test_payments_with_text_amounts() {
        let df = df![
            "TRAVEL_ID" => ["T1", "T1"],
            "PAYMENT_AMT_WON" => ["1000", "abc"],
            "STORE_NM" => ["편의점", "편의점"],
        ]
        .unwrap();
        let table = ActivityPaymentTable::from_frame(&df).unwrap();
        let summaries = aggregate_activity_spend(&table);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].payment_sum, 1000);
        assert_eq!(summaries[0].payment_count, 2);
        assert_eq!(summaries[0].store_count, 1);
    }

    #[test]
    fn test_history_counts() {
        let df = df![
            "TRAVEL_ID" => ["T1", "T1", "T1", "T2"],
            "ACTIVITY_TYPE_CD" => ["1", "1.0", "3", ""],
        ]
        .unwrap();
        let table = ActivityEventTable::from_frame(&df).unwrap();
        let summaries = aggregate_activity_history(&table);

        assert_eq!(
            summaries,
            vec![
                ActivityHistorySummary {
                    travel_id: "T1".into(),
                    history_rows: 3,
                    type_unique: 2
                },
                ActivityHistorySummary {
                    travel_id: "T2".into(),
                    history_rows: 1,
                    type_unique: 0
                },
            ]
        );
    }

    #[test]
    fn test_empty_frames_have_columns() {
        let spend = activity_spend_frame(&[]).unwrap();
        assert_eq!(column_names(&spend), ACTIVITY_SPEND_COLUMNS.to_vec());
        let history = activity_history_frame(&[]).unwrap();
        assert_eq!(column_names(&history), ACTIVITY_HISTORY_COLUMNS.to_vec());
    }
}
