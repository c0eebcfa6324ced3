use super::codebook::province_code;
use super::{DataCleaner, drop_columns};
use crate::error::Result;
use crate::table::{has_column, put_i64_column, put_string_column, string_cells};
use crate::utils::{format_number, median, parse_numeric_string};
use once_cell::sync::Lazy;
use polars::prelude::DataFrame;
use tracing::info;

/// (source column, derived code column)
const PROVINCE_COLUMNS: [(&str, &str); 2] = [
    ("TRAVEL_STATUS_RESIDENCE", "TRAVEL_STATUS_RESIDENCE_CODE"),
    ("TRAVEL_STATUS_DESTINATION", "TRAVEL_STATUS_DESTINATION_CODE"),
];

const ZERO_FILLS: [&str; 2] = ["TRAVEL_MOTIVE_2", "TRAVEL_MOTIVE_3"];

static TRAVELER_DROPS: Lazy<Vec<String>> = Lazy::new(|| {
    let mut names = vec!["TRAVEL_STATUS_YMD".to_string()];
    names.extend((1..=8).map(|i| format!("TRAVEL_STYLE_{}", i)));
    names.extend((1..=7).map(|i| format!("TRAVEL_STYL_{}", i)));
    names.push("JOB_ETC".to_string());
    names.push("EDU_FNSH_SE".to_string());
    names
});

impl DataCleaner {
    /// Derive province codes, drop style and bookkeeping columns and fill
    /// sparse income and motive fields.
    pub fn clean_traveler_master(&self, df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
        info!("Cleaning traveler master table...");
        let mut actions = Vec::new();
        let mut df = df;

        for (source, target) in PROVINCE_COLUMNS {
            if !has_column(&df, source) {
                continue;
            }
            // unknown regions (abroad, islands) get code 0
            let codes = string_cells(&df, source)?
                .into_iter()
                .map(|text| Some(text.as_deref().and_then(province_code).unwrap_or(0)))
                .collect();
            put_i64_column(&mut df, target, codes)?;
            actions.push(format!("Derived {} from {}", target, source));
        }

        let drops: Vec<&str> = TRAVELER_DROPS.iter().map(String::as_str).collect();
        let mut df = drop_columns(df, &drops, &mut actions);

        if has_column(&df, "HOUSE_INCOME") {
            let cells = string_cells(&df, "HOUSE_INCOME")?;
            let fill = median(cells.iter().map(|c| c.as_deref().and_then(parse_numeric_string)));
            if let Some(fill) = fill {
                let rendered = format_number(fill);
                let missing = cells.iter().filter(|c| c.is_none()).count();
                if missing > 0 {
                    let cells = cells
                        .into_iter()
                        .map(|c| c.or_else(|| Some(rendered.clone())))
                        .collect();
                    put_string_column(&mut df, "HOUSE_INCOME", cells)?;
                    actions.push(format!("Filled {} HOUSE_INCOME cells with median {}", missing, rendered));
                }
            }
        }

        for column in ZERO_FILLS {
            if !has_column(&df, column) {
                continue;
            }
            let cells: Vec<Option<String>> = string_cells(&df, column)?;
            let missing = cells.iter().filter(|c| c.is_none()).count();
            if missing > 0 {
                let cells = cells
                    .into_iter()
                    .map(|c| c.or_else(|| Some("0".to_string())))
                    .collect();
                put_string_column(&mut df, column, cells)?;
                actions.push(format!("Filled {} '{}' cells with 0", missing, column));
            }
        }

        Ok((df, actions))
    }
}
