use super::codebook::lodging_type_name;
use super::{DataCleaner, NO_INFO, drop_columns};
use crate::encoding::{CategoryMapping, FactorizedColumn, factorize};
use crate::error::Result;
use crate::table::{has_column, put_i64_column, put_string_column, string_cells};
use crate::utils::{parse_code, parse_date};
use polars::prelude::DataFrame;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

const LODGING_DROPS: [&str; 6] = [
    "CHK_IN_DT_MIN",
    "CHK_OUT_DT_MIN",
    "BRNO",
    "ROAD_NM_CD",
    "LOTNO_CD",
    "PAYMENT_ETC",
];

const NO_INFO_FILLS: [&str; 3] = ["ROAD_NM_ADDR", "LOTNO_ADDR", "STORE_NM"];

/// Lodging columns encoded into `_ENC` columns.
pub const LODGING_ENCODED_COLUMNS: [&str; 3] = ["RSVT_YN", "LODGING_TYPE_CD", "PAYMENT_MTHD_SE"];

/// Output of [`DataCleaner::clean_lodging_consumption`].
#[derive(Debug, Clone)]
pub struct LodgingCleaning {
    pub df: DataFrame,
    pub actions: Vec<String>,
    /// One entry per encoded column that was present
    pub encodings: Vec<FactorizedColumn>,
}

impl LodgingCleaning {
    /// Encoder mappings keyed by source column, for the JSON sidecar.
    pub fn mappings(&self) -> BTreeMap<String, CategoryMapping> {
        self.encodings
            .iter()
            .map(|column| (column.source.clone(), column.mapping.clone()))
            .collect()
    }
}

impl DataCleaner {
    /// Clean the lodging table.
    ///
    /// `trips` is the raw travel table; its `TRAVEL_START_YMD` stands in for
    /// a missing `PAYMENT_DT`.
    pub fn clean_lodging_consumption(
        &self,
        df: DataFrame,
        trips: &DataFrame,
    ) -> Result<LodgingCleaning> {
        info!("Cleaning lodging consumption table...");
        let mut actions = Vec::new();
        let mut df = df;

        if has_column(&df, "PAYMENT_DT") && has_column(&df, "TRAVEL_ID") {
            let starts = trip_start_dates(trips)?;
            let ids = string_cells(&df, "TRAVEL_ID")?;
            let mut filled = 0usize;
            let payment_dates: Vec<Option<String>> = string_cells(&df, "PAYMENT_DT")?
                .into_iter()
                .zip(&ids)
                .map(|(cell, id)| {
                    let parsed = cell.as_deref().and_then(parse_date);
                    match parsed {
                        Some(_) => cell,
                        None => {
                            let fallback = id.as_ref().and_then(|id| starts.get(id)).cloned();
                            filled += usize::from(fallback.is_some());
                            fallback
                        }
                    }
                })
                .collect();
            put_string_column(&mut df, "PAYMENT_DT", payment_dates)?;
            if filled > 0 {
                actions.push(format!("Filled {} PAYMENT_DT cells with the trip start date", filled));
            }
        }

        let mut df = drop_columns(df, &LODGING_DROPS, &mut actions);

        for column in NO_INFO_FILLS {
            if !has_column(&df, column) {
                continue;
            }
            let cells = string_cells(&df, column)?;
            let missing = cells.iter().filter(|cell| cell.is_none()).count();
            if missing > 0 {
                let cells = cells
                    .into_iter()
                    .map(|cell| cell.or_else(|| Some(NO_INFO.to_string())))
                    .collect();
                put_string_column(&mut df, column, cells)?;
                actions.push(format!("Filled {} missing '{}' cells with '{}'", missing, column, NO_INFO));
            }
        }

        if has_column(&df, "LODGING_TYPE_CD") && !has_column(&df, "LODGING_TYPE_NM") {
            let names = string_cells(&df, "LODGING_TYPE_CD")?
                .into_iter()
                .map(|code| {
                    code.as_deref()
                        .and_then(parse_code)
                        .and_then(lodging_type_name)
                        .map(str::to_string)
                })
                .collect();
            put_string_column(&mut df, "LODGING_TYPE_NM", names)?;
            actions.push("Attached LODGING_TYPE_NM from the lodging codebook".to_string());
        }

        let mut encodings = Vec::new();
        for column in LODGING_ENCODED_COLUMNS {
            if !has_column(&df, column) {
                debug!("Lodging table has no '{}' column; not encoded", column);
                continue;
            }
            let encoded = factorize(column, &string_cells(&df, column)?);
            put_i64_column(
                &mut df,
                &encoded.output_name(),
                encoded.codes.iter().copied().map(Some).collect(),
            )?;
            actions.push(format!(
                "Encoded '{}' into {} ({} categories)",
                column,
                encoded.output_name(),
                encoded.mapping.len()
            ));
            encodings.push(encoded);
        }

        Ok(LodgingCleaning {
            df,
            actions,
            encodings,
        })
    }
}

/// Trip id to normalized start date (`%Y-%m-%d`), first occurrence wins.
fn trip_start_dates(trips: &DataFrame) -> Result<HashMap<String, String>> {
    let mut starts = HashMap::new();
    if !has_column(trips, "TRAVEL_ID") || !has_column(trips, "TRAVEL_START_YMD") {
        return Ok(starts);
    }
    let ids = string_cells(trips, "TRAVEL_ID")?;
    let dates = string_cells(trips, "TRAVEL_START_YMD")?;
    for (id, date) in ids.into_iter().zip(dates) {
        if let (Some(id), Some(date)) = (id, date.as_deref().and_then(parse_date)) {
            starts
                .entry(id)
                .or_insert_with(|| date.format("%Y-%m-%d").to_string());
        }
    }
    Ok(starts)
}
