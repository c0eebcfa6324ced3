use super::{TRAVEL_ID, TableColumns};
use crate::error::Result;
use chrono::NaiveDate;
use polars::prelude::DataFrame;

pub const VISIT_AREA_ID: &str = "VISIT_AREA_ID";
pub const VISIT_AREA_NM: &str = "VISIT_AREA_NM";
pub const VISIT_AREA_TYPE_CD: &str = "VISIT_AREA_TYPE_CD";
pub const DGSTFN: &str = "DGSTFN";
pub const REVISIT_INTENTION: &str = "REVISIT_INTENTION";
pub const RCMDTN_INTENTION: &str = "RCMDTN_INTENTION";
pub const VISIT_START_YMD: &str = "VISIT_START_YMD";
pub const VISIT_END_YMD: &str = "VISIT_END_YMD";

/// One visited area of a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitRecord {
    pub travel_id: String,
    pub visit_area_id: Option<String>,
    pub area_name: Option<String>,
    pub type_code: Option<i64>,
    /// Satisfaction, 1 to 5
    pub satisfaction: Option<f64>,
    pub revisit: Option<f64>,
    pub recommend: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// The visit-area table. The three score columns are required.
#[derive(Debug, Clone, Default)]
pub struct VisitTable {
    pub rows: Vec<VisitRecord>,
    pub has_type_code: bool,
    pub has_dates: bool,
}

impl VisitTable {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let columns = TableColumns::new(df, "visit_area_info");
        let ids = columns.required(TRAVEL_ID)?;
        // parse failures become None; only a missing column is an error
        columns.required(DGSTFN)?;
        columns.required(REVISIT_INTENTION)?;
        columns.required(RCMDTN_INTENTION)?;

        let area_ids = columns.text(VISIT_AREA_ID)?;
        let names = columns.text(VISIT_AREA_NM)?;
        let types = columns.codes(VISIT_AREA_TYPE_CD)?;
        let satisfaction = columns.numbers(DGSTFN)?;
        let revisit = columns.numbers(REVISIT_INTENTION)?;
        let recommend = columns.numbers(RCMDTN_INTENTION)?;
        let starts = columns.dates(VISIT_START_YMD)?;
        let ends = columns.dates(VISIT_END_YMD)?;

        let rows = ids
            .into_iter()
            .enumerate()
            .filter_map(|(row, id)| {
                Some(VisitRecord {
                    travel_id: id?,
                    visit_area_id: area_ids[row].clone(),
                    area_name: names[row].clone(),
                    type_code: types[row],
                    satisfaction: satisfaction[row],
                    revisit: revisit[row],
                    recommend: recommend[row],
                    start_date: starts[row],
                    end_date: ends[row],
                })
            })
            .collect();

        Ok(Self {
            rows,
            has_type_code: columns.has(VISIT_AREA_TYPE_CD),
            has_dates: columns.has(VISIT_START_YMD) && columns.has(VISIT_END_YMD),
        })
    }

    pub fn append(&mut self, other: VisitTable) {
        self.rows.extend(other.rows);
        self.has_type_code |= other.has_type_code;
        self.has_dates |= other.has_dates;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_parse_visits() {
        let df = df![
            "TRAVEL_ID" => ["t1", "t1", ""],
            "VISIT_AREA_TYPE_CD" => ["1", "21.0", "2"],
            "DGSTFN" => ["2", "x", "5"],
            "REVISIT_INTENTION" => ["5", "4", "5"],
            "RCMDTN_INTENTION" => ["1", "4", "5"],
            "VISIT_START_YMD" => ["2022-09-13", "2022-09-14", ""],
            "VISIT_END_YMD" => ["2022-09-13", "2022-09-14", ""],
        ]
        .unwrap();

        let table = VisitTable::from_frame(&df).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert!(table.has_type_code && table.has_dates);
        assert_eq!(table.rows[1].type_code, Some(21));
        assert_eq!(table.rows[1].satisfaction, None);
        assert_eq!(table.rows[0].recommend, Some(1.0));
    }

    #[test]
    fn test_missing_score_column_fails() {
        let df = df!["TRAVEL_ID" => ["t1"], "DGSTFN" => ["3"]].unwrap();
        let err = VisitTable::from_frame(&df).unwrap_err();
        assert!(err.to_string().contains("REVISIT_INTENTION"));
    }
}
