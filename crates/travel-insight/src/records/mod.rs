//! Typed per-table records.
//!
//! Every table the merge stage consumes is parsed once into a record table.
//! Columns the pipeline computes with become typed fields; optional columns
//! become capability flags on the table, so a feature block that needs a
//! column checks a flag instead of looking a name up. Columns the pipeline
//! only carries through to the output are kept as text attributes.

mod activity;
mod lodging;
mod traveler;
mod trip;
mod visit;

pub use activity::{ActivityEvent, ActivityEventTable, ActivityPayment, ActivityPaymentTable};
pub use lodging::{LodgingPayment, LodgingPaymentTable};
pub use traveler::{TravelerRecord, TravelerTable};
pub use trip::{TripRecord, TripTable};
pub use visit::{VisitRecord, VisitTable};

use crate::error::{PipelineError, Result};
use crate::table::{column_names, has_column, string_cells};
use crate::utils::{parse_code, parse_date, parse_numeric_string};
use chrono::NaiveDate;
use polars::prelude::DataFrame;

/// Shared key column of every per-trip table.
pub const TRAVEL_ID: &str = "TRAVEL_ID";

/// Key column of the traveler table.
pub const TRAVELER_ID: &str = "TRAVELER_ID";

/// Column access scoped to one named table, so missing columns are
/// reported against the right table.
pub(crate) struct TableColumns<'a> {
    df: &'a DataFrame,
    table: &'static str,
}

impl<'a> TableColumns<'a> {
    pub(crate) fn new(df: &'a DataFrame, table: &'static str) -> Self {
        Self { df, table }
    }

    pub(crate) fn height(&self) -> usize {
        self.df.height()
    }

    pub(crate) fn has(&self, name: &str) -> bool {
        has_column(self.df, name)
    }

    /// Text cells of a column the table cannot do without.
    pub(crate) fn required(&self, name: &str) -> Result<Vec<Option<String>>> {
        if !self.has(name) {
            return Err(PipelineError::column_not_found(self.table, name));
        }
        string_cells(self.df, name)
    }

    /// Text cells of an optional column; all `None` when it is absent.
    pub(crate) fn text(&self, name: &str) -> Result<Vec<Option<String>>> {
        if self.has(name) {
            string_cells(self.df, name)
        } else {
            Ok(vec![None; self.height()])
        }
    }

    pub(crate) fn numbers(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(self
            .text(name)?
            .into_iter()
            .map(|cell| cell.as_deref().and_then(parse_numeric_string))
            .collect())
    }

    pub(crate) fn codes(&self, name: &str) -> Result<Vec<Option<i64>>> {
        Ok(self
            .text(name)?
            .into_iter()
            .map(|cell| cell.as_deref().and_then(parse_code))
            .collect())
    }

    pub(crate) fn dates(&self, name: &str) -> Result<Vec<Option<NaiveDate>>> {
        Ok(self
            .text(name)?
            .into_iter()
            .map(|cell| cell.as_deref().and_then(parse_date))
            .collect())
    }

    /// Every column except the listed ones, in frame order.
    pub(crate) fn remaining(&self, consumed: &[&str]) -> Vec<String> {
        column_names(self.df)
            .into_iter()
            .filter(|name| !consumed.contains(&name.as_str()))
            .collect()
    }

    /// Row-major text cells for the given columns.
    pub(crate) fn attribute_rows(&self, names: &[String]) -> Result<Vec<Vec<Option<String>>>> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            columns.push(string_cells(self.df, name)?);
        }
        Ok((0..self.height())
            .map(|row| columns.iter().map(|cells| cells[row].clone()).collect())
            .collect())
    }
}

/// Merge attribute column lists across years. Returns the union in
/// first-seen order and, for `other`, the position of each of its columns
/// in the union.
pub(crate) fn union_names(base: &mut Vec<String>, other: &[String]) -> Vec<usize> {
    other
        .iter()
        .map(|name| match base.iter().position(|n| n == name) {
            Some(index) => index,
            None => {
                base.push(name.clone());
                base.len() - 1
            }
        })
        .collect()
}

/// Re-lay a row's attributes onto a wider column set.
pub(crate) fn widen(
    attributes: Vec<Option<String>>,
    positions: &[usize],
    width: usize,
) -> Vec<Option<String>> {
    let mut widened = vec![None; width];
    for (value, &position) in attributes.into_iter().zip(positions) {
        widened[position] = value;
    }
    widened
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_required_column_names_table() {
        let df = df!["A" => ["x"]].unwrap();
        let columns = TableColumns::new(&df, "visit");
        let err = columns.required("TRAVEL_ID").unwrap_err();
        assert!(err.to_string().contains("visit"));
        assert!(err.to_string().contains("TRAVEL_ID"));
    }

    #[test]
    fn test_optional_column_reads_as_missing() {
        let df = df!["A" => ["1", "x"]].unwrap();
        let columns = TableColumns::new(&df, "trip");
        assert_eq!(columns.numbers("B").unwrap(), vec![None, None]);
        assert_eq!(columns.numbers("A").unwrap(), vec![Some(1.0), None]);
    }

    #[test]
    fn test_union_and_widen() {
        let mut base = vec!["A".to_string(), "B".to_string()];
        let positions = union_names(&mut base, &["C".to_string(), "A".to_string()]);
        assert_eq!(base, vec!["A", "B", "C"]);
        assert_eq!(positions, vec![2, 0]);

        let row = widen(vec![Some("c".into()), Some("a".into())], &positions, base.len());
        assert_eq!(row, vec![Some("a".to_string()), None, Some("c".to_string())]);
    }
}
