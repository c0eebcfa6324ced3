use super::codebook::activity_type_name;
use super::{DataCleaner, drop_columns};
use crate::error::Result;
use crate::table::{has_column, put_string_column, sort_by_cells, string_cells};
use crate::utils::parse_code;
use polars::prelude::DataFrame;
use tracing::{info, warn};

const CONSUMPTION_DROPS: [&str; 9] = [
    "SGG_CD",
    "ROAD_NM_ADDR",
    "LOTNO_ADDR",
    "ROAD_NM_CD",
    "LOTNO_CD",
    "BRNO",
    "PAYMENT_DT",
    "CONSUME_HIS_SEQ",
    "CONSUME_HIS_SNO",
];

const HISTORY_SORT_KEYS: [&str; 4] = [
    "TRAVEL_ID",
    "VISIT_AREA_ID",
    "ACTIVITY_TYPE_CD",
    "ACTIVITY_TYPE_SEQ",
];
const HISTORY_GROUP_KEYS: [&str; 3] = ["TRAVEL_ID", "VISIT_AREA_ID", "ACTIVITY_TYPE_CD"];
const HISTORY_FILL_COLUMNS: [&str; 4] = ["ACTIVITY_DTL", "RSVT_YN", "EXPND_SE", "ADMISSION_SE"];

impl DataCleaner {
    /// Drop unused address and bookkeeping columns from the activity
    /// consumption table.
    pub fn clean_activity_consumption(&self, df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
        info!("Cleaning activity consumption table...");
        let mut actions = Vec::new();

        let mut names: Vec<&str> = CONSUMPTION_DROPS.to_vec();
        for extra in &self.extra_activity_drops {
            if !names.contains(&extra.as_str()) {
                names.push(extra);
            }
        }
        let df = drop_columns(df, &names, &mut actions);
        Ok((df, actions))
    }

    /// Sort activities, forward-fill sparse details within each
    /// (trip, visit, activity type) group and attach `ACTIVITY_TYPE_NM`.
    pub fn clean_activity_history(&self, df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
        info!("Cleaning activity history table...");
        let mut actions = Vec::new();

        let mut df = sort_by_cells(&df, &HISTORY_SORT_KEYS)?;

        let group_keys: Vec<&str> = HISTORY_GROUP_KEYS
            .iter()
            .copied()
            .filter(|key| has_column(&df, key))
            .collect();
        let fill_columns: Vec<&str> = HISTORY_FILL_COLUMNS
            .iter()
            .copied()
            .filter(|column| has_column(&df, column))
            .collect();

        if !group_keys.is_empty() && !fill_columns.is_empty() {
            let keys: Vec<Vec<Option<String>>> = group_keys
                .iter()
                .map(|key| string_cells(&df, key))
                .collect::<Result<_>>()?;
            let group_of = |row: usize| -> Vec<Option<&str>> {
                keys.iter().map(|cells| cells[row].as_deref()).collect()
            };

            for column in &fill_columns {
                let mut cells = string_cells(&df, column)?;
                let mut filled = 0usize;
                for row in 1..cells.len() {
                    if cells[row].is_none() && group_of(row) == group_of(row - 1) {
                        cells[row] = cells[row - 1].clone();
                        filled += usize::from(cells[row].is_some());
                    }
                }
                if filled > 0 {
                    actions.push(format!("Forward-filled {} cells in '{}'", filled, column));
                }
                put_string_column(&mut df, column, cells)?;
            }
        }

        if has_column(&df, "ACTIVITY_TYPE_CD") {
            let names: Vec<Option<String>> = string_cells(&df, "ACTIVITY_TYPE_CD")?
                .into_iter()
                .map(|code| {
                    let code = code?;
                    let key = parse_code(&code).map_or(code, |parsed| parsed.to_string());
                    activity_type_name(&key).map(str::to_string)
                })
                .collect();
            put_string_column(&mut df, "ACTIVITY_TYPE_NM", names)?;
            actions.push("Attached ACTIVITY_TYPE_NM from the activity codebook".to_string());
        } else {
            warn!("Activity history has no ACTIVITY_TYPE_CD column; skipping activity names");
        }

        Ok((df, actions))
    }
}
