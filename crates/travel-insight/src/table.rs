//! DataFrame helpers: CSV I/O and typed column access.
//!
//! Raw tables are read with schema inference disabled so that every column
//! arrives as text. Typing happens in the record layer ([`crate::records`]),
//! where a bad cell turns into a null instead of a failed read.

use crate::error::{PipelineError, Result};
use crate::utils::{compare_cells, non_blank};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

/// Read a CSV file with a header row, all columns as strings.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PipelineError::MissingFile(path.to_path_buf()));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!("Read {} ({} rows x {} cols)", path.display(), df.height(), df.width());
    Ok(df)
}

/// Write a DataFrame as UTF-8 CSV with a header row, creating parent dirs.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)?;

    debug!("Wrote {} ({} rows x {} cols)", path.display(), df.height(), df.width());
    Ok(())
}

/// Check whether the frame has a column with this exact name.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Names of the frame's columns, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|c| c.to_string()).collect()
}

/// Cells of a column as text. Blank cells and missing-value markers
/// (`"NaN"`, `"null"`, ...) come back as `None`.
pub fn string_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::column_not_found("input", name))?;
    let series = column.as_materialized_series().cast(&DataType::String)?;
    let cells = series
        .str()?
        .into_iter()
        .map(|value| non_blank(value).map(str::to_string))
        .collect();
    Ok(cells)
}

/// Like [`string_cells`] but `None` when the column does not exist.
pub fn optional_string_cells(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>> {
    if has_column(df, name) {
        string_cells(df, name).map(Some)
    } else {
        Ok(None)
    }
}

/// Drop every listed column that exists; absent names are ignored.
pub fn drop_existing(df: DataFrame, names: &[&str]) -> DataFrame {
    let present: Vec<PlSmallStr> = names
        .iter()
        .filter(|name| has_column(&df, name))
        .map(|name| PlSmallStr::from(*name))
        .collect();
    if present.is_empty() {
        return df;
    }
    debug!("Dropping columns: {:?}", present);
    df.drop_many(present)
}

/// Put a text column into the frame, replacing a column of the same name.
pub fn put_string_column(df: &mut DataFrame, name: &str, cells: Vec<Option<String>>) -> Result<()> {
    let series = Series::new(name.into(), cells);
    if has_column(df, name) {
        df.replace(name, series)?;
    } else {
        df.with_column(series)?;
    }
    Ok(())
}

/// Put an integer column into the frame, replacing a column of the same name.
pub fn put_i64_column(df: &mut DataFrame, name: &str, values: Vec<Option<i64>>) -> Result<()> {
    let series = Series::new(name.into(), values);
    if has_column(df, name) {
        df.replace(name, series)?;
    } else {
        df.with_column(series)?;
    }
    Ok(())
}

/// Put a float column into the frame, replacing a column of the same name.
pub fn put_f64_column(df: &mut DataFrame, name: &str, values: Vec<f64>) -> Result<()> {
    let series = Series::new(name.into(), values);
    if has_column(df, name) {
        df.replace(name, series)?;
    } else {
        df.with_column(series)?;
    }
    Ok(())
}

/// Stable sort of the frame by the given key columns, comparing numerically
/// whenever both cells are numbers. Keys that do not exist are skipped.
pub fn sort_by_cells(df: &DataFrame, keys: &[&str]) -> Result<DataFrame> {
    let mut key_cells = Vec::new();
    for key in keys {
        if let Some(cells) = optional_string_cells(df, key)? {
            key_cells.push(cells);
        }
    }
    if key_cells.is_empty() {
        return Ok(df.clone());
    }

    let mut order: Vec<usize> = (0..df.height()).collect();
    order.sort_by(|&a, &b| {
        key_cells
            .iter()
            .map(|cells| compare_cells(cells[a].as_deref(), cells[b].as_deref()))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let indices: Vec<IdxSize> = order.into_iter().map(|i| i as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), indices);
    Ok(df.take(&idx)?)
}
