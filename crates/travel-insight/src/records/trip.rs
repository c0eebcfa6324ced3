use super::{TRAVEL_ID, TRAVELER_ID, TableColumns, union_names, widen};
use crate::error::Result;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use tracing::debug;

pub const TRAVEL_START_YMD: &str = "TRAVEL_START_YMD";
pub const TRAVEL_END_YMD: &str = "TRAVEL_END_YMD";
pub const TRAVEL_PURPOSE: &str = "TRAVEL_PURPOSE";
pub const TRAVEL_MISSION_CHECK: &str = "TRAVEL_MISSION_CHECK";

/// Columns never carried into the feature table.
const LEAKAGE_COLUMNS: [&str; 2] = ["TRAVEL_NM", "TRAVEL_MISSION"];

/// One trip of the base travel table.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub travel_id: String,
    pub traveler_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Raw `;`-delimited purpose codes
    pub purpose: Option<String>,
    /// Raw `;`-delimited mission codes
    pub mission_check: Option<String>,
    /// Pass-through columns, aligned with [`TripTable::attribute_names`]
    pub attributes: Vec<Option<String>>,
}

/// The travel table with its capabilities.
#[derive(Debug, Clone, Default)]
pub struct TripTable {
    pub attribute_names: Vec<String>,
    pub rows: Vec<TripRecord>,
    pub has_traveler_id: bool,
    pub has_dates: bool,
    pub has_purpose: bool,
    pub has_mission_check: bool,
}

impl TripTable {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let columns = TableColumns::new(df, "travel");
        let ids = columns.required(TRAVEL_ID)?;
        let traveler_ids = columns.text(TRAVELER_ID)?;
        let starts = columns.dates(TRAVEL_START_YMD)?;
        let ends = columns.dates(TRAVEL_END_YMD)?;
        let purposes = columns.text(TRAVEL_PURPOSE)?;
        let missions = columns.text(TRAVEL_MISSION_CHECK)?;

        let mut consumed = vec![
            TRAVEL_ID,
            TRAVELER_ID,
            TRAVEL_START_YMD,
            TRAVEL_END_YMD,
            TRAVEL_PURPOSE,
            TRAVEL_MISSION_CHECK,
        ];
        consumed.extend(LEAKAGE_COLUMNS);
        let attribute_names = columns.remaining(&consumed);
        let attributes = columns.attribute_rows(&attribute_names)?;

        let mut rows = Vec::with_capacity(ids.len());
        for (row, attributes) in attributes.into_iter().enumerate() {
            let Some(travel_id) = ids[row].clone() else {
                continue;
            };
            rows.push(TripRecord {
                travel_id,
                traveler_id: traveler_ids[row].clone(),
                start_date: starts[row],
                end_date: ends[row],
                purpose: purposes[row].clone(),
                mission_check: missions[row].clone(),
                attributes,
            });
        }
        if rows.len() < ids.len() {
            debug!("Skipped {} trips without an id", ids.len() - rows.len());
        }

        Ok(Self {
            attribute_names,
            rows,
            has_traveler_id: columns.has(TRAVELER_ID),
            has_dates: columns.has(TRAVEL_START_YMD) && columns.has(TRAVEL_END_YMD),
            has_purpose: columns.has(TRAVEL_PURPOSE),
            has_mission_check: columns.has(TRAVEL_MISSION_CHECK),
        })
    }

    /// Append another year's trips; capabilities are the union of both.
    pub fn append(&mut self, other: TripTable) {
        let positions = union_names(&mut self.attribute_names, &other.attribute_names);
        let width = self.attribute_names.len();
        for row in &mut self.rows {
            row.attributes.resize(width, None);
        }
        self.rows.extend(other.rows.into_iter().map(|mut row| {
            row.attributes = widen(row.attributes, &positions, width);
            row
        }));
        self.has_traveler_id |= other.has_traveler_id;
        self.has_dates |= other.has_dates;
        self.has_purpose |= other.has_purpose;
        self.has_mission_check |= other.has_mission_check;
    }

    /// Keep the first trip for every id.
    pub fn dedupe(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen = std::collections::HashSet::new();
        self.rows.retain(|row| seen.insert(row.travel_id.clone()));
        before - self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_parse_trip_table() {
        let df = df![
            "TRAVEL_ID" => ["a_1", "a_2"],
            "TRAVEL_NM" => ["trip one", "trip two"],
            "TRAVELER_ID" => ["u1", "u2"],
            "TRAVEL_START_YMD" => ["2022-09-13", "bad"],
            "TRAVEL_END_YMD" => ["2022-09-15", "2022-10-01"],
            "TRAVEL_PURPOSE" => ["1;3", ""],
            "MVMN_NM" => ["자가용", "대중교통 등"],
        ]
        .unwrap();

        let table = TripTable::from_frame(&df).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert!(table.has_dates);
        assert!(table.has_purpose);
        assert!(!table.has_mission_check);
        assert_eq!(table.attribute_names, vec!["MVMN_NM".to_string()]);
        assert_eq!(table.rows[0].start_date, NaiveDate::from_ymd_opt(2022, 9, 13));
        assert_eq!(table.rows[1].start_date, None);
        assert_eq!(table.rows[1].purpose, None);
    }

    #[test]
    fn test_append_aligns_attributes() {
        let first = TripTable::from_frame(&df!["TRAVEL_ID" => ["a"], "X" => ["1"]].unwrap()).unwrap();
        let second = TripTable::from_frame(
            &df!["TRAVEL_ID" => ["b"], "Y" => ["2"], "X" => ["3"], "TRAVEL_MISSION_CHECK" => ["1"]]
                .unwrap(),
        )
        .unwrap();

        let mut table = first;
        table.append(second);
        assert_eq!(table.attribute_names, vec!["X".to_string(), "Y".to_string()]);
        assert_eq!(table.rows[0].attributes, vec![Some("1".to_string()), None]);
        assert_eq!(
            table.rows[1].attributes,
            vec![Some("3".to_string()), Some("2".to_string())]
        );
        assert!(table.has_mission_check);
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let mut table =
            TripTable::from_frame(&df!["TRAVEL_ID" => ["a", "b", "a"], "X" => ["1", "2", "3"]].unwrap())
                .unwrap();
        assert_eq!(table.dedupe(), 1);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].attributes[0].as_deref(), Some("1"));
    }
}
