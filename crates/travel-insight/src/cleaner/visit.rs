use super::{DataCleaner, drop_columns};
use crate::error::Result;
use polars::prelude::DataFrame;
use tracing::info;

const VISIT_DROPS: [&str; 11] = [
    "ROAD_NM_ADDR",
    "LOTNO_ADDR",
    "X_COORD",
    "Y_COORD",
    "ROAD_NM_CD",
    "LOTNO_CD",
    "POI_ID",
    "POI_NM",
    "RESIDENCE_TIME_MIN",
    "LODGING_TYPE_CD",
    "SGG_CD",
];

impl DataCleaner {
    /// Drop address, coordinate and point-of-interest columns from the
    /// visit-area table.
    pub fn clean_visit_area(&self, df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
        info!("Cleaning visit area table...");
        let mut actions = Vec::new();
        let df = drop_columns(df, &VISIT_DROPS, &mut actions);
        Ok((df, actions))
    }
}
