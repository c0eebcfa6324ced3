//! Visit-area aggregation and the trip failure label.
//!
//! A visit is *failed* when at least [`MIN_LOW_SCORES`] of its three scores
//! (satisfaction, revisit intention, recommend intention) are at or below
//! [`LOW_SCORE_CUTOFF`]. Visits whose area type is excluded (home, office,
//! transfer points) carry no flag and are left out of the averages. A trip is
//! failed when the share of failed visits among flagged visits reaches
//! [`FAILED_TRIP_RATIO`]; a trip without flagged visits has share 0.

use crate::config::{MoveCountScope, PipelineConfig};
use crate::error::Result;
use crate::records::{VisitRecord, VisitTable};
use crate::utils::mean;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;

/// A score at or below this value is low.
pub const LOW_SCORE_CUTOFF: f64 = 3.0;

/// Low scores needed for a failed visit.
pub const MIN_LOW_SCORES: usize = 2;

/// Share of failed visits at which the trip is labeled failed.
pub const FAILED_TRIP_RATIO: f64 = 0.5;

pub const VISIT_SUMMARY_COLUMNS: [&str; 7] = [
    "TRAVEL_ID",
    "DGSTFN_AVG",
    "REVISIT_AVG",
    "RCMDTN_AVG",
    "TRIP_DAYS",
    "MOVE_CNT",
    "IS_FAILED_TRIP",
];

/// Per-trip visit statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitSummary {
    pub travel_id: String,
    pub dgstfn_avg: Option<f64>,
    pub revisit_avg: Option<f64>,
    pub rcmdtn_avg: Option<f64>,
    /// Inclusive span from the first visit start to the last visit end
    pub trip_days: Option<i64>,
    pub move_cnt: i64,
    /// 0 or 1
    pub is_failed_trip: i64,
}

#[derive(Debug, Clone)]
pub struct VisitAggregator {
    excluded_types: Vec<i64>,
    move_count_scope: MoveCountScope,
}

impl Default for VisitAggregator {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl VisitAggregator {
    pub fn new(excluded_types: Vec<i64>, move_count_scope: MoveCountScope) -> Self {
        Self {
            excluded_types,
            move_count_scope,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.excluded_visit_types.clone(), config.move_count_scope)
    }

    fn is_excluded(&self, visit: &VisitRecord) -> bool {
        visit
            .type_code
            .is_some_and(|code| self.excluded_types.contains(&code))
    }

    /// Failed-visit flag; `None` for excluded visit types. A missing score
    /// never counts as low.
    pub fn failed_visit(&self, visit: &VisitRecord) -> Option<bool> {
        if self.is_excluded(visit) {
            return None;
        }
        let low_count = [visit.satisfaction, visit.revisit, visit.recommend]
            .into_iter()
            .filter(|score| score.is_some_and(|s| s <= LOW_SCORE_CUTOFF))
            .count();
        Some(low_count >= MIN_LOW_SCORES)
    }

    /// One summary per trip id, ordered by trip id.
    pub fn aggregate(&self, visits: &VisitTable) -> Vec<VisitSummary> {
        let mut trips: BTreeMap<&str, Vec<&VisitRecord>> = BTreeMap::new();
        for visit in &visits.rows {
            trips.entry(visit.travel_id.as_str()).or_default().push(visit);
        }

        trips
            .into_iter()
            .map(|(travel_id, trip_visits)| self.summarize(travel_id, &trip_visits))
            .collect()
    }

    fn summarize(&self, travel_id: &str, visits: &[&VisitRecord]) -> VisitSummary {
        let scored: Vec<&VisitRecord> = visits
            .iter()
            .copied()
            .filter(|visit| !self.is_excluded(visit))
            .collect();

        let failure_ratio = mean(
            visits
                .iter()
                .map(|visit| self.failed_visit(visit).map(|failed| f64::from(u8::from(failed)))),
        )
        .unwrap_or(0.0);

        let first_start: Option<NaiveDate> = visits.iter().filter_map(|v| v.start_date).min();
        let last_end: Option<NaiveDate> = visits.iter().filter_map(|v| v.end_date).max();
        let trip_days = match (first_start, last_end) {
            (Some(start), Some(end)) => Some((end - start).num_days() + 1),
            _ => None,
        };

        let move_cnt = match self.move_count_scope {
            MoveCountScope::AllVisits => visits.len(),
            MoveCountScope::ScoredVisits => scored.len(),
        } as i64;

        VisitSummary {
            travel_id: travel_id.to_string(),
            dgstfn_avg: mean(scored.iter().map(|v| v.satisfaction)),
            revisit_avg: mean(scored.iter().map(|v| v.revisit)),
            rcmdtn_avg: mean(scored.iter().map(|v| v.recommend)),
            trip_days,
            move_cnt,
            is_failed_trip: i64::from(failure_ratio >= FAILED_TRIP_RATIO),
        }
    }
}

/// Frame form of visit summaries; empty input keeps every column.
pub fn visit_summary_frame(summaries: &[VisitSummary]) -> Result<DataFrame> {
    let ids: Vec<&str> = summaries.iter().map(|s| s.travel_id.as_str()).collect();
    let dgstfn: Vec<Option<f64>> = summaries.iter().map(|s| s.dgstfn_avg).collect();
    let revisit: Vec<Option<f64>> = summaries.iter().map(|s| s.revisit_avg).collect();
    let rcmdtn: Vec<Option<f64>> = summaries.iter().map(|s| s.rcmdtn_avg).collect();
    let days: Vec<Option<i64>> = summaries.iter().map(|s| s.trip_days).collect();
    let moves: Vec<i64> = summaries.iter().map(|s| s.move_cnt).collect();
    let failed: Vec<i64> = summaries.iter().map(|s| s.is_failed_trip).collect();

    let df = DataFrame::new(vec![
        Column::new(VISIT_SUMMARY_COLUMNS[0].into(), ids),
        Column::new(VISIT_SUMMARY_COLUMNS[1].into(), dgstfn),
        Column::new(VISIT_SUMMARY_COLUMNS[2].into(), revisit),
        Column::new(VISIT_SUMMARY_COLUMNS[3].into(), rcmdtn),
        Column::new(VISIT_SUMMARY_COLUMNS[4].into(), days),
        Column::new(VISIT_SUMMARY_COLUMNS[5].into(), moves),
        Column::new(VISIT_SUMMARY_COLUMNS[6].into(), failed),
    ])?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column_names;
    use pretty_assertions::assert_eq;

    fn visit(travel_id: &str, type_code: i64, scores: [Option<f64>; 3]) -> VisitRecord {
        VisitRecord {
            travel_id: travel_id.to_string(),
            visit_area_id: None,
            area_name: None,
            type_code: Some(type_code),
            satisfaction: scores[0],
            revisit: scores[1],
            recommend: scores[2],
            start_date: None,
            end_date: None,
        }
    }

    fn table(rows: Vec<VisitRecord>) -> VisitTable {
        VisitTable {
            rows,
            has_type_code: true,
            has_dates: true,
        }
    }

    #[test]
    fn test_two_low_scores_fail_a_visit() {
        let aggregator = VisitAggregator::default();
        let v = visit("T1", 1, [Some(2.0), Some(5.0), Some(1.0)]);
        assert_eq!(aggregator.failed_visit(&v), Some(true));

        let v = visit("T1", 1, [Some(3.0), Some(4.0), None]);
        assert_eq!(aggregator.failed_visit(&v), Some(false));

        let v = visit("T1", 21, [Some(1.0), Some(1.0), Some(1.0)]);
        assert_eq!(aggregator.failed_visit(&v), None);
    }

    #[test]
    fn test_three_of_four_failed_visits_fail_the_trip() {
        let low = [Some(2.0), Some(5.0), Some(1.0)];
        let visits = table(vec![
            visit("T1", 1, low),
            visit("T1", 2, low),
            visit("T1", 3, low),
            visit("T1", 4, [Some(5.0), Some(5.0), Some(5.0)]),
        ]);

        let summaries = VisitAggregator::default().aggregate(&visits);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].is_failed_trip, 1);
        assert_eq!(summaries[0].move_cnt, 4);
        assert_eq!(summaries[0].dgstfn_avg, Some(2.75));
    }

    #[test]
    fn test_ratio_below_half_is_not_failed() {
        let visits = table(vec![
            visit("T1", 1, [Some(1.0), Some(1.0), Some(5.0)]),
            visit("T1", 1, [Some(5.0), Some(5.0), Some(5.0)]),
            visit("T1", 1, [Some(4.0), Some(4.0), Some(4.0)]),
        ]);
        let summaries = VisitAggregator::default().aggregate(&visits);
        assert_eq!(summaries[0].is_failed_trip, 0);
    }

    #[test]
    fn test_all_excluded_visits() {
        let visits = table(vec![
            visit("T9", 21, [Some(1.0), Some(1.0), Some(1.0)]),
            visit("T9", 23, [Some(1.0), Some(1.0), Some(1.0)]),
        ]);
        let aggregator = VisitAggregator::new(vec![21, 22, 23], MoveCountScope::ScoredVisits);
        let summary = &aggregator.aggregate(&visits)[0];

        assert_eq!(summary.dgstfn_avg, None);
        assert_eq!(summary.rcmdtn_avg, None);
        assert_eq!(summary.is_failed_trip, 0);
        assert_eq!(summary.move_cnt, 0);
    }

    #[test]
    fn test_trip_days_span() {
        let mut first = visit("T1", 1, [Some(5.0); 3]);
        first.start_date = NaiveDate::from_ymd_opt(2022, 9, 13);
        first.end_date = NaiveDate::from_ymd_opt(2022, 9, 13);
        let mut last = visit("T1", 1, [Some(5.0); 3]);
        last.start_date = NaiveDate::from_ymd_opt(2022, 9, 15);
        last.end_date = NaiveDate::from_ymd_opt(2022, 9, 15);
        let undated = visit("T2", 1, [Some(5.0); 3]);

        let summaries = VisitAggregator::default().aggregate(&table(vec![last, undated, first]));
        assert_eq!(summaries[0].trip_days, Some(3));
        assert_eq!(summaries[1].trip_days, None);
    }

    #[test]
    fn test_summaries_sorted_by_trip_id() {
        let visits = table(vec![
            visit("b", 1, [Some(5.0); 3]),
            visit("a", 1, [Some(5.0); 3]),
        ]);
        let ids: Vec<String> = VisitAggregator::default()
            .aggregate(&visits)
            .into_iter()
            .map(|s| s.travel_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_summary_frame() {
        let df = visit_summary_frame(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(column_names(&df), VISIT_SUMMARY_COLUMNS.to_vec());
    }
}
