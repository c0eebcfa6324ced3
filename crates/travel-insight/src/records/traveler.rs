use super::{TRAVELER_ID, TableColumns, union_names, widen};
use crate::error::Result;
use polars::prelude::DataFrame;
use std::collections::HashSet;

pub const FAMILY_MEMB: &str = "FAMILY_MEMB";
pub const TRAVEL_COMPANIONS_NUM: &str = "TRAVEL_COMPANIONS_NUM";

/// One traveler from the traveler master table.
///
/// `FAMILY_MEMB` and `TRAVEL_COMPANIONS_NUM` are parsed for the ratio
/// features and are also kept as attributes so they reach the output.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelerRecord {
    pub traveler_id: String,
    pub family_members: Option<f64>,
    pub companions: Option<f64>,
    pub attributes: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct TravelerTable {
    pub attribute_names: Vec<String>,
    pub rows: Vec<TravelerRecord>,
    pub has_family_members: bool,
    pub has_companions: bool,
}

impl TravelerTable {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let columns = TableColumns::new(df, "traveller_master");
        let ids = columns.required(TRAVELER_ID)?;
        let family = columns.numbers(FAMILY_MEMB)?;
        let companions = columns.numbers(TRAVEL_COMPANIONS_NUM)?;
        let attribute_names = columns.remaining(&[TRAVELER_ID]);
        let attributes = columns.attribute_rows(&attribute_names)?;

        let rows = ids
            .into_iter()
            .zip(attributes)
            .enumerate()
            .filter_map(|(row, (id, attributes))| {
                Some(TravelerRecord {
                    traveler_id: id?,
                    family_members: family[row],
                    companions: companions[row],
                    attributes,
                })
            })
            .collect();

        Ok(Self {
            attribute_names,
            rows,
            has_family_members: columns.has(FAMILY_MEMB),
            has_companions: columns.has(TRAVEL_COMPANIONS_NUM),
        })
    }

    pub fn append(&mut self, other: TravelerTable) {
        let positions = union_names(&mut self.attribute_names, &other.attribute_names);
        let width = self.attribute_names.len();
        for row in &mut self.rows {
            row.attributes.resize(width, None);
        }
        self.rows.extend(other.rows.into_iter().map(|mut row| {
            row.attributes = widen(row.attributes, &positions, width);
            row
        }));
        self.has_family_members |= other.has_family_members;
        self.has_companions |= other.has_companions;
    }

    /// Keep the first record for every traveler id.
    pub fn dedupe(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.traveler_id.clone()));
        before - self.rows.len()
    }
}
