//! Multi-value categorical expansion.
//!
//! A column such as `TRAVEL_PURPOSE` holds code lists like `"1;3;7"`. The
//! expander turns it into a fixed set of indicator columns: one per top-N
//! code, an `OTHER` flag for rows holding any code outside the top-N and a
//! `COUNT` of codes per row.

use crate::utils::split_codes;
use serde::Serialize;
use std::collections::HashMap;

/// Indicator values of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeIndicators {
    /// One 0/1 flag per top code, in [`ExpandedCodes::top_codes`] order
    pub flags: Vec<i64>,
    pub other: i64,
    pub count: i64,
}

/// Output of [`CategoricalExpander::expand`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedCodes {
    pub prefix: String,
    /// Kept codes, most frequent first
    pub top_codes: Vec<String>,
    #[serde(skip)]
    pub rows: Vec<CodeIndicators>,
}

impl ExpandedCodes {
    /// Output column names: indicators, then `OTHER`, then `COUNT`.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .top_codes
            .iter()
            .map(|code| format!("{}{}", self.prefix, code))
            .collect();
        names.push(format!("{}OTHER", self.prefix));
        names.push(format!("{}COUNT", self.prefix));
        names
    }

    /// Values of one row, aligned with [`Self::column_names`].
    pub fn row_values(&self, row: usize) -> Vec<i64> {
        let indicators = &self.rows[row];
        let mut values = indicators.flags.clone();
        values.push(indicators.other);
        values.push(indicators.count);
        values
    }

    /// Number of output columns.
    pub fn width(&self) -> usize {
        self.top_codes.len() + 2
    }
}

/// Expands delimiter-separated code columns into indicator columns.
#[derive(Debug, Clone)]
pub struct CategoricalExpander {
    delimiter: char,
    top_n: usize,
}

impl CategoricalExpander {
    pub fn new(delimiter: char, top_n: usize) -> Self {
        Self { delimiter, top_n }
    }

    /// Expand a column. Frequencies are counted over the whole column; equal
    /// counts keep the order in which the codes first appear.
    pub fn expand(&self, values: &[Option<String>], prefix: &str) -> ExpandedCodes {
        let code_lists: Vec<Vec<String>> = values
            .iter()
            .map(|value| split_codes(value.as_deref(), self.delimiter))
            .collect();

        let mut frequencies: Vec<(String, usize)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for code in code_lists.iter().flatten() {
            match positions.get(code) {
                Some(&index) => frequencies[index].1 += 1,
                None => {
                    positions.insert(code.clone(), frequencies.len());
                    frequencies.push((code.clone(), 1));
                }
            }
        }
        // stable: ties stay in first-appearance order
        frequencies.sort_by(|a, b| b.1.cmp(&a.1));
        let top_codes: Vec<String> = frequencies
            .into_iter()
            .take(self.top_n)
            .map(|(code, _)| code)
            .collect();

        let rows = code_lists
            .iter()
            .map(|codes| CodeIndicators {
                flags: top_codes
                    .iter()
                    .map(|top| i64::from(codes.contains(top)))
                    .collect(),
                other: i64::from(codes.iter().any(|code| !top_codes.contains(code))),
                count: codes.len() as i64,
            })
            .collect();

        ExpandedCodes {
            prefix: prefix.to_string(),
            top_codes,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_top_n_with_other_and_count() {
        let values = cells(&[Some("1;3;7"), Some("3"), Some("3;9"), None, Some("")]);
        let expanded = CategoricalExpander::new(';', 2).expand(&values, "P_");

        // 3 appears three times; 1, 7 and 9 tie and 1 appeared first
        assert_eq!(expanded.top_codes, vec!["3", "1"]);
        assert_eq!(
            expanded.column_names(),
            vec!["P_3", "P_1", "P_OTHER", "P_COUNT"]
        );
        assert_eq!(expanded.row_values(0), vec![1, 1, 1, 3]);
        assert_eq!(expanded.row_values(1), vec![1, 0, 0, 1]);
        assert_eq!(expanded.row_values(2), vec![1, 0, 1, 2]);
        assert_eq!(expanded.row_values(3), vec![0, 0, 0, 0]);
        assert_eq!(expanded.row_values(4), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_exactly_top_n_distinct_codes() {
        let values = cells(&[Some("a;b"), Some("c"), Some(" b ; c ;")]);
        let expanded = CategoricalExpander::new(';', 3).expand(&values, "X_");

        assert_eq!(expanded.width(), 5);
        let others: Vec<i64> = expanded.rows.iter().map(|r| r.other).collect();
        let counts: Vec<i64> = expanded.rows.iter().map(|r| r.count).collect();
        assert_eq!(others, vec![0, 0, 0]);
        assert_eq!(counts, vec![2, 1, 2]);
    }

    #[test]
    fn test_empty_column_keeps_other_and_count() {
        let expanded = CategoricalExpander::new(';', 10).expand(&cells(&[None, None]), "M_");
        assert_eq!(expanded.column_names(), vec!["M_OTHER", "M_COUNT"]);
        assert_eq!(expanded.row_values(1), vec![0, 0]);
    }
}
