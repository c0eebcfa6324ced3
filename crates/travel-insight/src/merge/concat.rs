//! Year concatenation of typed tables.

use crate::records::{
    ActivityEventTable, ActivityPaymentTable, LodgingPaymentTable, TravelerTable, TripTable,
    VisitTable,
};

/// A record table that can absorb another year's rows.
pub trait YearTable: Default {
    /// Append `other` after the current rows.
    fn append_year(&mut self, other: Self);

    fn row_count(&self) -> usize;
}

/// Concatenate tables in the given (year) order; row order within each
/// year is kept.
pub fn concat_years<T, I>(tables: I) -> T
where
    T: YearTable,
    I: IntoIterator<Item = T>,
{
    let mut combined = T::default();
    for table in tables {
        combined.append_year(table);
    }
    combined
}

macro_rules! impl_year_table {
    ($($table:ty),* $(,)?) => {
        $(
            impl YearTable for $table {
                fn append_year(&mut self, other: Self) {
                    self.append(other);
                }

                fn row_count(&self) -> usize {
                    self.rows.len()
                }
            }
        )*
    };
}

impl_year_table!(
    TripTable,
    VisitTable,
    ActivityPaymentTable,
    ActivityEventTable,
    LodgingPaymentTable,
    TravelerTable,
);
