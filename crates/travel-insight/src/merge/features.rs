//! The per-trip feature row and its derived values.

use crate::error::Result;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// Inclusive day count of a trip.
pub fn travel_length(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<i64> {
    Some((end? - start?).num_days() + 1)
}

/// 1 spring (Mar-May), 2 summer (Jun-Aug), 3 autumn (Sep-Nov), 4 winter.
pub fn season(month: u32) -> i64 {
    match month {
        3..=5 => 1,
        6..=8 => 2,
        9..=11 => 3,
        _ => 4,
    }
}

/// Start month and season of a trip.
pub fn start_month_and_season(start: Option<NaiveDate>) -> (Option<i64>, Option<i64>) {
    match start {
        Some(date) => (Some(i64::from(date.month())), Some(season(date.month()))),
        None => (None, None),
    }
}

/// Ratio with a null numerator read as 0 and a null or non-positive
/// denominator replaced by 1.
pub fn guarded_ratio(numerator: Option<f64>, denominator: Option<f64>) -> f64 {
    let numerator = numerator.unwrap_or(0.0);
    let denominator = denominator.filter(|d| *d > 0.0).unwrap_or(1.0);
    numerator / denominator
}

/// Per-day value; 0 when the trip length is null or not positive.
pub fn per_day(numerator: Option<f64>, length: Option<i64>) -> f64 {
    match length {
        Some(days) if days > 0 => numerator.unwrap_or(0.0) / days as f64,
        _ => 0.0,
    }
}

/// Which feature blocks the input tables support.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSchema {
    pub trip_attribute_names: Vec<String>,
    pub trip_dates: bool,
    pub purpose_columns: Option<Vec<String>>,
    pub mission_columns: Option<Vec<String>>,
    pub activity_payment_sum: bool,
    pub activity_store_count: bool,
    pub activity_type_unique: bool,
    pub lodging_payment_sum: bool,
    pub lodging_store_count: bool,
    pub visit_trip_days: bool,
    pub traveler_attribute_names: Vec<String>,
    pub companions_per_family: bool,
}

impl FeatureSchema {
    pub fn activity_rows_per_day(&self) -> bool {
        self.trip_dates
    }

    pub fn payment_sum_per_day(&self) -> bool {
        self.trip_dates && (self.activity_payment_sum || self.lodging_payment_sum)
    }

    pub fn move_cnt_per_day(&self) -> bool {
        self.trip_dates
    }

    pub fn activity_lodging_spend_ratio(&self) -> bool {
        self.activity_payment_sum && self.lodging_payment_sum
    }

    /// Output column names, in output order.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec!["TRAVEL_ID".to_string()];
        names.extend(self.trip_attribute_names.iter().cloned());
        if self.trip_dates {
            names.extend(["TRAVEL_LENGTH", "TRAVEL_START_MONTH", "SEASON"].map(String::from));
        }
        names.extend(self.purpose_columns.iter().flatten().cloned());
        names.extend(self.mission_columns.iter().flatten().cloned());

        let optional = [
            ("activity_payment_sum", self.activity_payment_sum),
            ("activity_payment_count", true),
            ("activity_store_count", self.activity_store_count),
            ("activity_history_rows", true),
            ("activity_type_unique", self.activity_type_unique),
            ("lodging_payment_sum", self.lodging_payment_sum),
            ("lodging_payment_count", true),
            ("lodging_store_count", self.lodging_store_count),
            ("visit_trip_days", self.visit_trip_days),
            ("visit_move_cnt", true),
            ("IS_FAILED_TRIP", true),
        ];
        names.extend(optional.iter().filter(|(_, on)| *on).map(|(n, _)| n.to_string()));
        names.extend(self.traveler_attribute_names.iter().cloned());

        let ratios = [
            ("activity_rows_per_day", self.activity_rows_per_day()),
            ("payment_sum_per_day", self.payment_sum_per_day()),
            ("move_cnt_per_day", self.move_cnt_per_day()),
            ("activity_lodging_spend_ratio", self.activity_lodging_spend_ratio()),
            ("companions_per_family", self.companions_per_family),
        ];
        names.extend(ratios.iter().filter(|(_, on)| *on).map(|(n, _)| n.to_string()));
        names
    }
}

/// One trip of the final table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    pub travel_id: String,
    pub trip_attributes: Vec<Option<String>>,
    pub travel_length: Option<i64>,
    pub travel_start_month: Option<i64>,
    pub season: Option<i64>,
    pub purpose: Vec<i64>,
    pub mission: Vec<i64>,
    pub activity_payment_sum: Option<i64>,
    pub activity_payment_count: i64,
    pub activity_store_count: i64,
    pub activity_history_rows: i64,
    pub activity_type_unique: i64,
    pub lodging_payment_sum: Option<i64>,
    pub lodging_payment_count: i64,
    pub lodging_store_count: i64,
    pub visit_trip_days: Option<i64>,
    pub visit_move_cnt: i64,
    pub is_failed_trip: Option<i64>,
    pub traveler_attributes: Vec<Option<String>>,
    /// Family size, used only for `companions_per_family`
    pub family_members: Option<f64>,
    /// Companion count, used only for `companions_per_family`
    pub companions: Option<f64>,
    pub activity_rows_per_day: f64,
    pub payment_sum_per_day: f64,
    pub move_cnt_per_day: f64,
    pub activity_lodging_spend_ratio: f64,
    pub companions_per_family: f64,
}

impl FeatureRow {
    /// Whether every column the schema emits has a value.
    pub fn is_complete(&self, schema: &FeatureSchema) -> bool {
        let dates_ok = !schema.trip_dates
            || (self.travel_length.is_some()
                && self.travel_start_month.is_some()
                && self.season.is_some());
        let sums_ok = (!schema.activity_payment_sum || self.activity_payment_sum.is_some())
            && (!schema.lodging_payment_sum || self.lodging_payment_sum.is_some());
        let visit_ok = self.is_failed_trip.is_some()
            && (!schema.visit_trip_days || self.visit_trip_days.is_some());

        dates_ok
            && sums_ok
            && visit_ok
            && self.trip_attributes.iter().all(Option::is_some)
            && self.traveler_attributes.iter().all(Option::is_some)
    }
}

/// Feature rows together with the schema that decides their columns.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub schema: FeatureSchema,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// Drop rows with any missing value. Returns the number dropped.
    pub fn drop_incomplete(&mut self) -> usize {
        let before = self.rows.len();
        let schema = &self.schema;
        self.rows.retain(|row| row.is_complete(schema));
        before - self.rows.len()
    }

    pub fn to_frame(&self) -> Result<DataFrame> {
        let schema = &self.schema;
        let rows = self.rows.as_slice();
        let mut columns: Vec<Column> = Vec::new();

        columns.push(Column::new(
            "TRAVEL_ID".into(),
            rows.iter().map(|r| r.travel_id.as_str()).collect::<Vec<_>>(),
        ));
        for (i, name) in schema.trip_attribute_names.iter().enumerate() {
            columns.push(text_column(name, rows, |r| r.trip_attributes[i].clone()));
        }
        if schema.trip_dates {
            columns.push(int_column("TRAVEL_LENGTH", rows, |r| r.travel_length));
            columns.push(int_column("TRAVEL_START_MONTH", rows, |r| r.travel_start_month));
            columns.push(int_column("SEASON", rows, |r| r.season));
        }
        if let Some(names) = &schema.purpose_columns {
            for (i, name) in names.iter().enumerate() {
                columns.push(int_column(name, rows, |r| Some(r.purpose[i])));
            }
        }
        if let Some(names) = &schema.mission_columns {
            for (i, name) in names.iter().enumerate() {
                columns.push(int_column(name, rows, |r| Some(r.mission[i])));
            }
        }

        if schema.activity_payment_sum {
            columns.push(int_column("activity_payment_sum", rows, |r| r.activity_payment_sum));
        }
        columns.push(int_column("activity_payment_count", rows, |r| {
            Some(r.activity_payment_count)
        }));
        if schema.activity_store_count {
            columns.push(int_column("activity_store_count", rows, |r| {
                Some(r.activity_store_count)
            }));
        }
        columns.push(int_column("activity_history_rows", rows, |r| {
            Some(r.activity_history_rows)
        }));
        if schema.activity_type_unique {
            columns.push(int_column("activity_type_unique", rows, |r| {
                Some(r.activity_type_unique)
            }));
        }
        if schema.lodging_payment_sum {
            columns.push(int_column("lodging_payment_sum", rows, |r| r.lodging_payment_sum));
        }
        columns.push(int_column("lodging_payment_count", rows, |r| {
            Some(r.lodging_payment_count)
        }));
        if schema.lodging_store_count {
            columns.push(int_column("lodging_store_count", rows, |r| {
                Some(r.lodging_store_count)
            }));
        }
        if schema.visit_trip_days {
            columns.push(int_column("visit_trip_days", rows, |r| r.visit_trip_days));
        }
        columns.push(int_column("visit_move_cnt", rows, |r| Some(r.visit_move_cnt)));
        columns.push(int_column("IS_FAILED_TRIP", rows, |r| r.is_failed_trip));

        for (i, name) in schema.traveler_attribute_names.iter().enumerate() {
            columns.push(text_column(name, rows, |r| r.traveler_attributes[i].clone()));
        }

        if schema.activity_rows_per_day() {
            columns.push(float_column("activity_rows_per_day", rows, |r| r.activity_rows_per_day));
        }
        if schema.payment_sum_per_day() {
            columns.push(float_column("payment_sum_per_day", rows, |r| r.payment_sum_per_day));
        }
        if schema.move_cnt_per_day() {
            columns.push(float_column("move_cnt_per_day", rows, |r| r.move_cnt_per_day));
        }
        if schema.activity_lodging_spend_ratio() {
            columns.push(float_column("activity_lodging_spend_ratio", rows, |r| {
                r.activity_lodging_spend_ratio
            }));
        }
        if schema.companions_per_family {
            columns.push(float_column("companions_per_family", rows, |r| r.companions_per_family));
        }

        Ok(DataFrame::new(columns)?)
    }
}

fn text_column(
    name: &str,
    rows: &[FeatureRow],
    value: impl Fn(&FeatureRow) -> Option<String>,
) -> Column {
    Column::new(name.into(), rows.iter().map(value).collect::<Vec<_>>())
}

fn int_column(name: &str, rows: &[FeatureRow], value: impl Fn(&FeatureRow) -> Option<i64>) -> Column {
    Column::new(name.into(), rows.iter().map(value).collect::<Vec<_>>())
}

fn float_column(name: &str, rows: &[FeatureRow], value: impl Fn(&FeatureRow) -> f64) -> Column {
    Column::new(name.into(), rows.iter().map(value).collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column_names;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_travel_length_inclusive() {
        assert_eq!(travel_length(date(2022, 9, 13), date(2022, 9, 15)), Some(3));
        assert_eq!(travel_length(date(2022, 9, 13), date(2022, 9, 13)), Some(1));
        assert_eq!(travel_length(None, date(2022, 9, 13)), None);
    }

    #[test]
    fn test_seasons() {
        assert_eq!(season(3), 1);
        assert_eq!(season(8), 2);
        assert_eq!(season(11), 3);
        assert_eq!(season(12), 4);
        assert_eq!(season(2), 4);
        assert_eq!(start_month_and_season(date(2023, 7, 1)), (Some(7), Some(2)));
    }

    #[test]
    fn test_guarded_ratio() {
        assert_eq!(guarded_ratio(Some(6.0), Some(3.0)), 2.0);
        assert_eq!(guarded_ratio(None, Some(3.0)), 0.0);
        assert_eq!(guarded_ratio(Some(4.0), Some(0.0)), 4.0);
        assert_eq!(guarded_ratio(Some(4.0), None), 4.0);
        assert_eq!(guarded_ratio(Some(4.0), Some(-2.0)), 4.0);
    }

    #[test]
    fn test_per_day_zero_length() {
        assert_eq!(per_day(Some(10.0), Some(0)), 0.0);
        assert_eq!(per_day(Some(10.0), None), 0.0);
        assert_eq!(per_day(Some(10.0), Some(-1)), 0.0);
        assert_eq!(per_day(Some(10.0), Some(4)), 2.5);
    }

    #[test]
    fn test_frame_matches_schema_columns() {
        let schema = FeatureSchema {
            trip_attribute_names: vec!["MVMN_NM".into()],
            trip_dates: true,
            purpose_columns: Some(vec!["TRAVEL_PURPOSE_OTHER".into(), "TRAVEL_PURPOSE_COUNT".into()]),
            activity_payment_sum: true,
            lodging_payment_sum: true,
            visit_trip_days: true,
            traveler_attribute_names: vec!["GENDER".into()],
            ..Default::default()
        };
        let row = FeatureRow {
            travel_id: "T1".into(),
            trip_attributes: vec![Some("자가용".into())],
            travel_length: Some(2),
            travel_start_month: Some(9),
            season: Some(3),
            purpose: vec![0, 1],
            activity_payment_sum: Some(1000),
            lodging_payment_sum: Some(0),
            visit_trip_days: Some(2),
            is_failed_trip: Some(1),
            traveler_attributes: vec![Some("남".into())],
            ..Default::default()
        };
        let table = FeatureTable {
            schema: schema.clone(),
            rows: vec![row],
        };

        let df = table.to_frame().unwrap();
        assert_eq!(column_names(&df), schema.column_names());
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_drop_incomplete_rows() {
        let schema = FeatureSchema {
            traveler_attribute_names: vec!["GENDER".into()],
            ..Default::default()
        };
        let complete = FeatureRow {
            travel_id: "a".into(),
            is_failed_trip: Some(0),
            traveler_attributes: vec![Some("여".into())],
            ..Default::default()
        };
        let no_traveler = FeatureRow {
            travel_id: "b".into(),
            is_failed_trip: Some(0),
            traveler_attributes: vec![None],
            ..Default::default()
        };
        let no_label = FeatureRow {
            travel_id: "c".into(),
            traveler_attributes: vec![Some("남".into())],
            ..Default::default()
        };

        let mut table = FeatureTable {
            schema,
            rows: vec![complete, no_traveler, no_label],
        };
        assert_eq!(table.drop_incomplete(), 2);
        assert_eq!(table.rows[0].travel_id, "a");
    }
}
