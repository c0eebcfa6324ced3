//! Dataset merging.
//!
//! Builds the final per-trip feature table:
//! - Year concatenation of every typed table (`concat`)
//! - Left joins of the per-trip summaries onto the base trips (`merger`)
//! - Median imputation of sums and zero-filling of counts
//! - Trip-derived features and guarded ratios (`features`)
//! - A final drop of rows that still miss a value

pub mod concat;
pub mod features;
pub mod merger;

pub use concat::{YearTable, concat_years};
pub use features::{FeatureRow, FeatureSchema, FeatureTable};
pub use merger::{
    DatasetMerger, LEAKAGE_COLUMNS, MISSION_PREFIX, MergeInputs, MergeOutcome, MergeStats,
    PURPOSE_PREFIX,
};
