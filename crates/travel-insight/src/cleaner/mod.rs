//! Per-table cleaning of raw survey tables.
//!
//! This module provides functionality for:
//! - Dropping address, coordinate and bookkeeping columns
//! - Forward-filling sparse activity details
//! - Attaching display names from the built-in codebooks
//! - Filling sparse lodging and traveler fields
//! - Encoding lodging categories into `_ENC` columns
//!
//! Every cleaner takes an all-text frame and returns the cleaned frame plus
//! a list of human-readable actions. Columns a cleaner expects but does not
//! find are skipped.

mod activity;
pub mod codebook;
mod lodging;
mod traveler;
mod travel;
mod visit;

pub use lodging::{LODGING_ENCODED_COLUMNS, LodgingCleaning};

use crate::table::{drop_existing, has_column};
use polars::prelude::DataFrame;
use tracing::debug;

/// Placeholder written into sparse text fields.
pub const NO_INFO: &str = "정보없음";

/// Cleaner for the raw survey tables.
#[derive(Debug, Default, Clone)]
pub struct DataCleaner {
    /// Extra columns dropped from the activity-consumption table
    extra_activity_drops: Vec<String>,
}

impl DataCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop these columns from the activity-consumption table as well.
    pub fn with_activity_drops<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            let column = column.into();
            if !self.extra_activity_drops.contains(&column) {
                self.extra_activity_drops.push(column);
            }
        }
        self
    }
}

/// Drop the listed columns and record what was actually removed.
fn drop_columns(df: DataFrame, names: &[&str], actions: &mut Vec<String>) -> DataFrame {
    let present: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| has_column(&df, name))
        .collect();
    if present.is_empty() {
        return df;
    }
    debug!("Dropping {} columns", present.len());
    actions.push(format!("Dropped {} columns: {:?}", present.len(), present));
    drop_existing(df, &present)
}
