use super::{DataCleaner, NO_INFO, drop_columns};
use crate::error::Result;
use crate::table::{has_column, put_string_column, string_cells};
use polars::prelude::DataFrame;
use tracing::info;

const TRAVEL_DROPS: [&str; 2] = ["TRAVEL_MISSION", "TRAVEL_NM"];

impl DataCleaner {
    /// Drop the free-text mission and trip-name columns and fill a missing
    /// transport mode.
    pub fn clean_travel(&self, df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
        info!("Cleaning travel table...");
        let mut actions = Vec::new();
        let mut df = drop_columns(df, &TRAVEL_DROPS, &mut actions);

        if has_column(&df, "MVMN_NM") {
            let cells = string_cells(&df, "MVMN_NM")?;
            let missing = cells.iter().filter(|c| c.is_none()).count();
            if missing > 0 {
                let cells = cells
                    .into_iter()
                    .map(|c| c.or_else(|| Some(NO_INFO.to_string())))
                    .collect();
                put_string_column(&mut df, "MVMN_NM", cells)?;
                actions.push(format!("Filled {} missing MVMN_NM cells", missing));
            }
        }

        Ok((df, actions))
    }
}
