//! Per-trip aggregation.
//!
//! Each aggregator reduces a detail table to exactly one summary per trip
//! id found in that table. Summaries come back ordered by trip id. An empty
//! table yields no summaries, and its frame form still has every column.

mod activity;
mod lodging;
pub mod visit;

pub use activity::{
    ACTIVITY_HISTORY_COLUMNS, ACTIVITY_SPEND_COLUMNS, ActivityHistorySummary,
    ActivitySpendSummary, aggregate_activity_history, aggregate_activity_spend,
    activity_history_frame, activity_spend_frame,
};
pub use lodging::{LODGING_SPEND_COLUMNS, LodgingSpendSummary, aggregate_lodging_spend, lodging_spend_frame};
pub use visit::{VISIT_SUMMARY_COLUMNS, VisitAggregator, VisitSummary, visit_summary_frame};

use crate::error::Result;
use crate::utils::round_to_i64;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Spend statistics of one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendSummary {
    pub travel_id: String,
    /// Rounded sum of non-negative payments
    pub payment_sum: i64,
    /// Payment rows, including unparseable ones
    pub payment_count: i64,
    /// Distinct non-null store names
    pub store_count: i64,
}

/// Sum, count and distinct stores per trip. Missing or unparseable amounts
/// count as 0 and negative amounts are clamped to 0.
pub(crate) fn aggregate_spend<'a, I>(payments: I) -> Vec<SpendSummary>
where
    I: IntoIterator<Item = (&'a str, Option<f64>, Option<&'a str>)>,
{
    #[derive(Default)]
    struct Accumulator<'s> {
        sum: f64,
        count: i64,
        stores: BTreeSet<&'s str>,
    }

    let mut groups: BTreeMap<&str, Accumulator<'_>> = BTreeMap::new();
    for (travel_id, amount, store) in payments {
        let group = groups.entry(travel_id).or_default();
        group.sum += amount.unwrap_or(0.0).max(0.0);
        group.count += 1;
        if let Some(store) = store {
            group.stores.insert(store);
        }
    }

    groups
        .into_iter()
        .map(|(travel_id, group)| SpendSummary {
            travel_id: travel_id.to_string(),
            payment_sum: round_to_i64(group.sum),
            payment_count: group.count,
            store_count: group.stores.len() as i64,
        })
        .collect()
}

/// Frame form of spend summaries with `{prefix}_payment_sum`,
/// `{prefix}_payment_count` and `{prefix}_store_count` columns.
pub(crate) fn spend_frame(summaries: &[SpendSummary], names: &[&str; 4]) -> Result<DataFrame> {
    let ids: Vec<&str> = summaries.iter().map(|s| s.travel_id.as_str()).collect();
    let sums: Vec<i64> = summaries.iter().map(|s| s.payment_sum).collect();
    let counts: Vec<i64> = summaries.iter().map(|s| s.payment_count).collect();
    let stores: Vec<i64> = summaries.iter().map(|s| s.store_count).collect();

    let df = DataFrame::new(vec![
        Column::new(names[0].into(), ids),
        Column::new(names[1].into(), sums),
        Column::new(names[2].into(), counts),
        Column::new(names[3].into(), stores),
    ])?;
    Ok(df)
}
