use super::{TRAVEL_ID, TableColumns};
use crate::error::Result;
use crate::utils::parse_code;
use polars::prelude::DataFrame;

pub const PAYMENT_AMT_WON: &str = "PAYMENT_AMT_WON";
pub const STORE_NM: &str = "STORE_NM";
pub const ACTIVITY_TYPE_CD: &str = "ACTIVITY_TYPE_CD";

/// One payment from the activity-consumption table.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityPayment {
    pub travel_id: String,
    /// `None` when the cell was blank or not a number
    pub amount: Option<f64>,
    pub store_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityPaymentTable {
    pub rows: Vec<ActivityPayment>,
    pub has_amount: bool,
    pub has_store: bool,
}

impl ActivityPaymentTable {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let columns = TableColumns::new(df, "activity_consumption");
        let ids = columns.required(TRAVEL_ID)?;
        let amounts = columns.numbers(PAYMENT_AMT_WON)?;
        let stores = columns.text(STORE_NM)?;

        let rows = ids
            .into_iter()
            .enumerate()
            .filter_map(|(row, id)| {
                Some(ActivityPayment {
                    travel_id: id?,
                    amount: amounts[row],
                    store_name: stores[row].clone(),
                })
            })
            .collect();

        Ok(Self {
            rows,
            has_amount: columns.has(PAYMENT_AMT_WON),
            has_store: columns.has(STORE_NM),
        })
    }

    pub fn append(&mut self, other: ActivityPaymentTable) {
        self.rows.extend(other.rows);
        self.has_amount |= other.has_amount;
        self.has_store |= other.has_store;
    }
}

/// One logged activity from the activity-history table.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEvent {
    pub travel_id: String,
    /// Normalized type code (`"1.0"` and `"1"` compare equal)
    pub activity_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityEventTable {
    pub rows: Vec<ActivityEvent>,
    pub has_activity_type: bool,
}

impl ActivityEventTable {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let columns = TableColumns::new(df, "activity_history");
        let ids = columns.required(TRAVEL_ID)?;
        let types = columns.text(ACTIVITY_TYPE_CD)?;

        let rows = ids
            .into_iter()
            .zip(types)
            .filter_map(|(id, activity_type)| {
                Some(ActivityEvent {
                    travel_id: id?,
                    activity_type: activity_type.map(|code| match parse_code(&code) {
                        Some(parsed) => parsed.to_string(),
                        None => code,
                    }),
                })
            })
            .collect();

        Ok(Self {
            rows,
            has_activity_type: columns.has(ACTIVITY_TYPE_CD),
        })
    }

    pub fn append(&mut self, other: ActivityEventTable) {
        self.rows.extend(other.rows);
        self.has_activity_type |= other.has_activity_type;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_payments_keep_unparseable_rows() {
        let df = df![
            "TRAVEL_ID" => ["T1", "T1"],
            "PAYMENT_AMT_WON" => ["1000", "abc"],
        ]
        .unwrap();
        let table = ActivityPaymentTable::from_frame(&df).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].amount, None);
        assert!(!table.has_store);
    }

    #[test]
    fn test_activity_types_normalized() {
        let df = df![
            "TRAVEL_ID" => ["T1", "T1", "T1"],
            "ACTIVITY_TYPE_CD" => ["1", "1.0", "기타"],
        ]
        .unwrap();
        let table = ActivityEventTable::from_frame(&df).unwrap();
        let types: Vec<_> = table.rows.iter().map(|r| r.activity_type.as_deref()).collect();
        assert_eq!(types, vec![Some("1"), Some("1"), Some("기타")]);
    }
}
