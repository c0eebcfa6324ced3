//! Column encoders.
//!
//! Each encoder returns an explicit output type carrying the new column's
//! values together with what was learned to produce them, so callers never
//! inject suffixed columns by string manipulation alone.

pub mod label;
pub mod multi_value;
pub mod scaler;

pub use label::{CategoryMapping, CodedColumn, FactorizedColumn, LabelEncoder, factorize};
pub use multi_value::{CategoricalExpander, CodeIndicators, ExpandedCodes};
pub use scaler::{ScaledColumn, StandardScaler};
