//! Label encoding of text categories.
//!
//! Two flavors exist:
//!
//! - [`factorize`] gives sorted categories codes `0..n` and missing cells
//!   `-1`. It backs the `_ENC` columns of the lodging table.
//! - [`LabelEncoder`] reserves `0` for missing cells (`__NaN__`) and the
//!   last code for values unseen at fit time (`__UNK__`). It backs the
//!   `_CODE` columns of the ML table.

use crate::utils::compare_cells;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Token standing for a missing cell.
pub const NAN_TOKEN: &str = "__NaN__";

/// Token standing for a value not seen at fit time.
pub const UNKNOWN_TOKEN: &str = "__UNK__";

/// Ordered categories; a category's code is its position.
///
/// Serializes as a JSON object `{category: code}` in code order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryMapping {
    categories: Vec<String>,
}

impl CategoryMapping {
    pub fn new(categories: Vec<String>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn code_of(&self, value: &str) -> Option<i64> {
        self.categories
            .iter()
            .position(|category| category == value)
            .map(|index| index as i64)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Serialize for CategoryMapping {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (code, category) in self.categories.iter().enumerate() {
            map.serialize_entry(category, &code)?;
        }
        map.end()
    }
}

/// A `{source}_ENC` column produced by [`factorize`].
#[derive(Debug, Clone, PartialEq)]
pub struct FactorizedColumn {
    pub source: String,
    pub mapping: CategoryMapping,
    pub codes: Vec<i64>,
}

impl FactorizedColumn {
    pub fn output_name(&self) -> String {
        format!("{}_ENC", self.source)
    }
}

/// Sorted factorization. Categories are ordered numerically when both sides
/// are numbers and as text otherwise; missing cells get `-1`.
pub fn factorize(source: &str, cells: &[Option<String>]) -> FactorizedColumn {
    let mut categories: Vec<String> = Vec::new();
    for cell in cells.iter().flatten() {
        if !categories.contains(cell) {
            categories.push(cell.clone());
        }
    }
    categories.sort_by(|a, b| compare_cells(Some(a.as_str()), Some(b.as_str())));
    let mapping = CategoryMapping::new(categories);

    let codes = cells
        .iter()
        .map(|cell| {
            cell.as_deref()
                .and_then(|value| mapping.code_of(value))
                .unwrap_or(-1)
        })
        .collect();

    FactorizedColumn {
        source: source.to_string(),
        mapping,
        codes,
    }
}

/// Encoder with reserved tokens for missing and unseen values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelEncoder {
    mapping: CategoryMapping,
}

impl LabelEncoder {
    /// Learn the categories: `__NaN__`, then the observed values in
    /// lexicographic order, then `__UNK__`.
    pub fn fit(cells: &[Option<String>]) -> Self {
        let mut observed: Vec<String> = cells.iter().flatten().cloned().collect();
        observed.sort();
        observed.dedup();

        let mut categories = Vec::with_capacity(observed.len() + 2);
        categories.push(NAN_TOKEN.to_string());
        categories.extend(observed.into_iter().filter(|v| v != NAN_TOKEN && v != UNKNOWN_TOKEN));
        categories.push(UNKNOWN_TOKEN.to_string());

        Self {
            mapping: CategoryMapping::new(categories),
        }
    }

    pub fn transform(&self, cells: &[Option<String>]) -> Vec<i64> {
        let unknown = self.mapping.len() as i64 - 1;
        cells
            .iter()
            .map(|cell| match cell {
                None => 0,
                Some(value) => self.mapping.code_of(value).unwrap_or(unknown),
            })
            .collect()
    }

    pub fn mapping(&self) -> &CategoryMapping {
        &self.mapping
    }
}

/// A `{source}_CODE` column produced by a fitted [`LabelEncoder`].
#[derive(Debug, Clone, PartialEq)]
pub struct CodedColumn {
    pub source: String,
    pub encoder: LabelEncoder,
    pub codes: Vec<i64>,
}

impl CodedColumn {
    /// Fit an encoder on the column and encode it.
    pub fn fit_transform(source: &str, cells: &[Option<String>]) -> Self {
        let encoder = LabelEncoder::fit(cells);
        let codes = encoder.transform(cells);
        Self {
            source: source.to_string(),
            encoder,
            codes,
        }
    }

    pub fn output_name(&self) -> String {
        format!("{}_CODE", self.source)
    }
}
