use super::{SpendSummary, aggregate_spend, spend_frame};
use crate::error::Result;
use crate::records::LodgingPaymentTable;
use polars::prelude::DataFrame;

pub type LodgingSpendSummary = SpendSummary;

pub const LODGING_SPEND_COLUMNS: [&str; 4] = [
    "TRAVEL_ID",
    "lodging_payment_sum",
    "lodging_payment_count",
    "lodging_store_count",
];

/// Lodging payments per trip.
pub fn aggregate_lodging_spend(table: &LodgingPaymentTable) -> Vec<LodgingSpendSummary> {
    aggregate_spend(
        table
            .rows
            .iter()
            .map(|row| (row.travel_id.as_str(), row.amount, row.store_name.as_deref())),
    )
}

pub fn lodging_spend_frame(summaries: &[LodgingSpendSummary]) -> Result<DataFrame> {
    spend_frame(summaries, &LODGING_SPEND_COLUMNS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_lodging_spend() {
        let df = df![
            "TRAVEL_ID" => ["T1", "T2", "T2"],
            "PAYMENT_AMT_WON" => ["80000", "50,000", "-10000"],
            "STORE_NM" => ["호텔A", "펜션B", "정보없음"],
        ]
        .unwrap();
        let table = LodgingPaymentTable::from_frame(&df).unwrap();
        let summaries = aggregate_lodging_spend(&table);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].travel_id, "T2");
        assert_eq!(summaries[1].payment_sum, 50000);
        assert_eq!(summaries[1].store_count, 2);

        let frame = lodging_spend_frame(&summaries).unwrap();
        assert_eq!(frame.height(), 2);
    }
}
