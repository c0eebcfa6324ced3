use super::{TRAVEL_ID, TableColumns};
use crate::error::Result;
use polars::prelude::DataFrame;

const PAYMENT_AMT_WON: &str = "PAYMENT_AMT_WON";
const STORE_NM: &str = "STORE_NM";
const LODGING_TYPE_CD: &str = "LODGING_TYPE_CD";

/// One lodging payment.
#[derive(Debug, Clone, PartialEq)]
pub struct LodgingPayment {
    pub travel_id: String,
    pub amount: Option<f64>,
    pub store_name: Option<String>,
    pub lodging_type: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct LodgingPaymentTable {
    pub rows: Vec<LodgingPayment>,
    pub has_amount: bool,
    pub has_store: bool,
}

impl LodgingPaymentTable {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let columns = TableColumns::new(df, "lodging_consumption");
        let ids = columns.required(TRAVEL_ID)?;
        let amounts = columns.numbers(PAYMENT_AMT_WON)?;
        let stores = columns.text(STORE_NM)?;
        let types = columns.codes(LODGING_TYPE_CD)?;

        let rows = ids
            .into_iter()
            .enumerate()
            .filter_map(|(row, id)| {
                Some(LodgingPayment {
                    travel_id: id?,
                    amount: amounts[row],
                    store_name: stores[row].clone(),
                    lodging_type: types[row],
                })
            })
            .collect();

        Ok(Self {
            rows,
            has_amount: columns.has(PAYMENT_AMT_WON),
            has_store: columns.has(STORE_NM),
        })
    }

    pub fn append(&mut self, other: LodgingPaymentTable) {
        self.rows.extend(other.rows);
        self.has_amount |= other.has_amount;
        self.has_store |= other.has_store;
    }
}
