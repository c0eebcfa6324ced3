//! Joins every per-trip summary and the traveler table onto the base trip
//! table and finalizes the feature table.

use super::concat::YearTable;
use super::features::{
    FeatureRow, FeatureSchema, FeatureTable, guarded_ratio, per_day, start_month_and_season,
    travel_length,
};
use crate::aggregate::{
    VisitAggregator, aggregate_activity_history, aggregate_activity_spend,
    aggregate_lodging_spend,
};
use crate::config::PipelineConfig;
use crate::encoding::{CategoricalExpander, ExpandedCodes};
use crate::records::{
    ActivityEventTable, ActivityPaymentTable, LodgingPaymentTable, TRAVEL_ID, TravelerRecord,
    TravelerTable, TripTable, VisitTable,
};
use crate::utils::{median, round_to_i64};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Prefix of the purpose indicator columns.
pub const PURPOSE_PREFIX: &str = "TRAVEL_PURPOSE_";

/// Prefix of the mission indicator columns.
pub const MISSION_PREFIX: &str = "TRAVEL_MISSION_CHECK_";

/// Columns that never reach the feature table: raw satisfaction averages
/// (the label is derived from them), raw dates, free text, the traveler key
/// and the raw multi-value columns.
pub const LEAKAGE_COLUMNS: [&str; 11] = [
    "DGSTFN_AVG",
    "REVISIT_AVG",
    "RCMDTN_AVG",
    "TRAVEL_START_YMD",
    "TRAVEL_END_YMD",
    "TRAVEL_STATUS_YMD",
    "TRAVEL_NM",
    "TRAVEL_MISSION",
    "TRAVELER_ID",
    "TRAVEL_PURPOSE",
    "TRAVEL_MISSION_CHECK",
];

/// Every input table of one merge, concatenated across years.
#[derive(Debug, Clone, Default)]
pub struct MergeInputs {
    pub trips: TripTable,
    pub visits: VisitTable,
    pub activity_payments: ActivityPaymentTable,
    pub activity_events: ActivityEventTable,
    pub lodging_payments: LodgingPaymentTable,
    pub travelers: TravelerTable,
}

impl YearTable for MergeInputs {
    fn append_year(&mut self, other: Self) {
        self.trips.append_year(other.trips);
        self.visits.append_year(other.visits);
        self.activity_payments.append_year(other.activity_payments);
        self.activity_events.append_year(other.activity_events);
        self.lodging_payments.append_year(other.lodging_payments);
        self.travelers.append_year(other.travelers);
    }

    fn row_count(&self) -> usize {
        self.trips.row_count()
    }
}

/// Counters reported by a merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeStats {
    pub base_trips: usize,
    pub duplicate_trips: usize,
    pub duplicate_travelers: usize,
    pub trips_without_traveler: usize,
    pub activity_sum_imputed: usize,
    pub lodging_sum_imputed: usize,
    pub incomplete_rows_dropped: usize,
    pub final_rows: usize,
    /// Feature blocks left out because a table lacked a column
    pub skipped_blocks: Vec<String>,
}

/// Result of [`DatasetMerger::merge`].
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub table: FeatureTable,
    pub purpose_codes: Option<ExpandedCodes>,
    pub mission_codes: Option<ExpandedCodes>,
    pub stats: MergeStats,
}

/// Builds the per-trip feature table.
#[derive(Debug, Clone)]
pub struct DatasetMerger {
    expander: CategoricalExpander,
    visit_aggregator: VisitAggregator,
}

impl DatasetMerger {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            expander: CategoricalExpander::new(
                config.multi_value_delimiter,
                config.categorical_top_n,
            ),
            visit_aggregator: VisitAggregator::from_config(config),
        }
    }

    /// Join, impute and derive, then drop incomplete rows.
    pub fn merge(&self, inputs: MergeInputs) -> MergeOutcome {
        let mut outcome = self.build_features(inputs);
        let dropped = outcome.table.drop_incomplete();
        if dropped > 0 {
            info!("Dropped {} trips with missing values", dropped);
        }
        outcome.stats.incomplete_rows_dropped = dropped;
        outcome.stats.final_rows = outcome.table.rows.len();
        outcome
    }

    /// Every step except the final null-drop. One row per base trip.
    pub fn build_features(&self, inputs: MergeInputs) -> MergeOutcome {
        let MergeInputs {
            mut trips,
            visits,
            activity_payments,
            activity_events,
            lodging_payments,
            mut travelers,
        } = inputs;
        let mut stats = MergeStats::default();

        stats.duplicate_trips = trips.dedupe();
        stats.duplicate_travelers = travelers.dedupe();
        stats.base_trips = trips.rows.len();
        if stats.duplicate_trips > 0 {
            warn!("Dropped {} duplicate trip ids", stats.duplicate_trips);
        }
        info!("Merging features for {} trips", stats.base_trips);

        let mut skip = |block: &str, reason: &str| {
            warn!("Skipping {}: {}", block, reason);
            stats.skipped_blocks.push(block.to_string());
        };

        // capability checks
        if !trips.has_dates {
            skip("trip length features", "travel table lacks TRAVEL_START_YMD/TRAVEL_END_YMD");
        }
        if !trips.has_purpose {
            skip("TRAVEL_PURPOSE indicators", "travel table lacks TRAVEL_PURPOSE");
        }
        if !activity_payments.has_amount {
            skip("activity_payment_sum", "activity consumption lacks PAYMENT_AMT_WON");
        }
        if !activity_payments.has_store {
            skip("activity_store_count", "activity consumption lacks STORE_NM");
        }
        if !activity_events.has_activity_type {
            skip("activity_type_unique", "activity history lacks ACTIVITY_TYPE_CD");
        }
        if !lodging_payments.has_amount {
            skip("lodging_payment_sum", "lodging consumption lacks PAYMENT_AMT_WON");
        }
        if !lodging_payments.has_store {
            skip("lodging_store_count", "lodging consumption lacks STORE_NM");
        }
        if !visits.has_dates {
            skip("visit_trip_days", "visit table lacks VISIT_START_YMD/VISIT_END_YMD");
        }
        if !trips.has_traveler_id {
            skip("traveler features", "travel table lacks TRAVELER_ID");
        }
        let companions_ratio = trips.has_traveler_id
            && travelers.has_companions
            && travelers.has_family_members;
        if trips.has_traveler_id && !companions_ratio {
            skip(
                "companions_per_family",
                "traveler table lacks TRAVEL_COMPANIONS_NUM/FAMILY_MEMB",
            );
        }

        // categorical expansion over the base trips
        let purpose_codes = trips.has_purpose.then(|| {
            let values: Vec<Option<String>> = trips.rows.iter().map(|t| t.purpose.clone()).collect();
            self.expander.expand(&values, PURPOSE_PREFIX)
        });
        let mission_codes = trips.has_mission_check.then(|| {
            let values: Vec<Option<String>> =
                trips.rows.iter().map(|t| t.mission_check.clone()).collect();
            self.expander.expand(&values, MISSION_PREFIX)
        });

        // per-trip summaries
        let activity_spend = index_by_trip(aggregate_activity_spend(&activity_payments), |s| &s.travel_id);
        let activity_history =
            index_by_trip(aggregate_activity_history(&activity_events), |s| &s.travel_id);
        let lodging_spend = index_by_trip(aggregate_lodging_spend(&lodging_payments), |s| &s.travel_id);
        let visit_summaries =
            index_by_trip(self.visit_aggregator.aggregate(&visits), |s| &s.travel_id);
        debug!(
            "Summaries: {} activity spend, {} activity history, {} lodging, {} visit",
            activity_spend.len(),
            activity_history.len(),
            lodging_spend.len(),
            visit_summaries.len()
        );

        // traveler join
        let traveler_names: Vec<(usize, String)> = if trips.has_traveler_id {
            traveler_columns(&travelers.attribute_names, &trips.attribute_names)
        } else {
            Vec::new()
        };
        let traveler_index: HashMap<&str, &TravelerRecord> = travelers
            .rows
            .iter()
            .map(|t| (t.traveler_id.as_str(), t))
            .collect();

        let trip_names: Vec<(usize, String)> = trips
            .attribute_names
            .iter()
            .enumerate()
            .filter(|(_, name)| !LEAKAGE_COLUMNS.contains(&name.as_str()))
            .map(|(i, name)| (i, name.clone()))
            .collect();

        let mut rows = Vec::with_capacity(trips.rows.len());
        for (index, trip) in trips.rows.iter().enumerate() {
            let spend = activity_spend.get(trip.travel_id.as_str());
            let history = activity_history.get(trip.travel_id.as_str());
            let lodging = lodging_spend.get(trip.travel_id.as_str());
            let visit = visit_summaries.get(trip.travel_id.as_str());
            let (travel_start_month, season) = start_month_and_season(trip.start_date);

            let traveler = trip
                .traveler_id
                .as_deref()
                .and_then(|id| traveler_index.get(id).copied());
            if trips.has_traveler_id && traveler.is_none() {
                stats.trips_without_traveler += 1;
            }

            rows.push(FeatureRow {
                travel_id: trip.travel_id.clone(),
                trip_attributes: trip_names
                    .iter()
                    .map(|(i, _)| trip.attributes[*i].clone())
                    .collect(),
                travel_length: travel_length(trip.start_date, trip.end_date),
                travel_start_month,
                season,
                purpose: purpose_codes
                    .as_ref()
                    .map(|codes| codes.row_values(index))
                    .unwrap_or_default(),
                mission: mission_codes
                    .as_ref()
                    .map(|codes| codes.row_values(index))
                    .unwrap_or_default(),
                activity_payment_sum: spend.map(|s| s.payment_sum),
                activity_payment_count: spend.map_or(0, |s| s.payment_count),
                activity_store_count: spend.map_or(0, |s| s.store_count),
                activity_history_rows: history.map_or(0, |h| h.history_rows),
                activity_type_unique: history.map_or(0, |h| h.type_unique),
                lodging_payment_sum: lodging.map(|s| s.payment_sum),
                lodging_payment_count: lodging.map_or(0, |s| s.payment_count),
                lodging_store_count: lodging.map_or(0, |s| s.store_count),
                visit_trip_days: visit.and_then(|v| v.trip_days),
                visit_move_cnt: visit.map_or(0, |v| v.move_cnt),
                is_failed_trip: visit.map(|v| v.is_failed_trip),
                traveler_attributes: traveler_names
                    .iter()
                    .map(|(i, _)| traveler.and_then(|t| t.attributes[*i].clone()))
                    .collect(),
                family_members: traveler.and_then(|t| t.family_members),
                companions: traveler.and_then(|t| t.companions),
                ..FeatureRow::default()
            });
        }

        stats.activity_sum_imputed = impute_median(&mut rows, |row| &mut row.activity_payment_sum, "activity_payment_sum");
        stats.lodging_sum_imputed = impute_median(&mut rows, |row| &mut row.lodging_payment_sum, "lodging_payment_sum");

        for row in &mut rows {
            derive_ratios(row);
        }

        let schema = FeatureSchema {
            trip_attribute_names: trip_names.into_iter().map(|(_, name)| name).collect(),
            trip_dates: trips.has_dates,
            purpose_columns: purpose_codes.as_ref().map(ExpandedCodes::column_names),
            mission_columns: mission_codes.as_ref().map(ExpandedCodes::column_names),
            activity_payment_sum: activity_payments.has_amount,
            activity_store_count: activity_payments.has_store,
            activity_type_unique: activity_events.has_activity_type,
            lodging_payment_sum: lodging_payments.has_amount,
            lodging_store_count: lodging_payments.has_store,
            visit_trip_days: visits.has_dates,
            traveler_attribute_names: traveler_names.into_iter().map(|(_, name)| name).collect(),
            companions_per_family: companions_ratio,
        };

        MergeOutcome {
            table: FeatureTable { schema, rows },
            purpose_codes,
            mission_codes,
            stats,
        }
    }
}

fn index_by_trip<T>(summaries: Vec<T>, key: impl Fn(&T) -> &String) -> HashMap<String, T> {
    summaries
        .into_iter()
        .map(|summary| (key(&summary).clone(), summary))
        .collect()
}

/// Traveler attribute columns kept in the output: leakage columns and names
/// already taken by the trip table are left out.
fn traveler_columns(traveler_names: &[String], trip_names: &[String]) -> Vec<(usize, String)> {
    traveler_names
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            if name.as_str() == TRAVEL_ID || LEAKAGE_COLUMNS.contains(&name.as_str()) {
                return false;
            }
            if trip_names.contains(name) {
                warn!("Traveler column '{}' clashes with a trip column; keeping the trip value", name);
                return false;
            }
            true
        })
        .map(|(i, name)| (i, name.clone()))
        .collect()
}

/// Fill missing sums with the rounded median of the trips that have one.
/// When no trip has a value, the sum is 0.
fn impute_median(
    rows: &mut [FeatureRow],
    field: impl Fn(&mut FeatureRow) -> &mut Option<i64>,
    name: &str,
) -> usize {
    let mut present = Vec::with_capacity(rows.len());
    for row in rows.iter_mut() {
        present.push(field(row).map(|v| v as f64));
    }
    let missing = present.iter().filter(|v| v.is_none()).count();
    if missing == 0 {
        return 0;
    }

    let fill = match median(present) {
        Some(value) => round_to_i64(value),
        None => {
            warn!("No trip has {}; filling with 0", name);
            0
        }
    };
    for row in rows.iter_mut() {
        let slot = field(row);
        if slot.is_none() {
            *slot = Some(fill);
        }
    }
    debug!("Imputed {} missing {} with {}", missing, name, fill);
    missing
}

fn derive_ratios(row: &mut FeatureRow) {
    let activity_sum = row.activity_payment_sum.map(|v| v as f64);
    let lodging_sum = row.lodging_payment_sum.map(|v| v as f64);
    let total_spend = match (activity_sum, lodging_sum) {
        (None, None) => None,
        (a, l) => Some(a.unwrap_or(0.0) + l.unwrap_or(0.0)),
    };

    row.activity_rows_per_day = per_day(Some(row.activity_history_rows as f64), row.travel_length);
    row.payment_sum_per_day = per_day(total_spend, row.travel_length);
    row.move_cnt_per_day = per_day(Some(row.visit_move_cnt as f64), row.travel_length);
    row.activity_lodging_spend_ratio =
        guarded_ratio(activity_sum, Some(lodging_sum.unwrap_or(0.0) + 1.0));
    row.companions_per_family = guarded_ratio(row.companions, row.family_members);
}
