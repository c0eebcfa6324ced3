//! Travel Insight Library
//!
//! Builds a per-trip feature table from multi-table travel-survey records,
//! labelled with whether the trip failed, ready for a binary classifier.
//!
//! # Overview
//!
//! Raw survey tables (trips, visited areas, activity logs, lodging payments,
//! traveler demographics) go through three stages:
//!
//! - **Preprocess**: per-table cleaning for one (mode, year), written to
//!   `<output>/<mode>/<year>/preprocessing/`
//! - **Merge**: year concatenation, per-trip aggregation, left joins,
//!   imputation, derived ratios and the `IS_FAILED_TRIP` label, written to
//!   `<output>/<mode>/final/travel_insight.csv`
//! - **ML**: `_CODE` label encodings and `_SCALED` standardized columns,
//!   written to `<output>/<mode>/final/travel_ml.csv`
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use travel_insight::{DatasetMode, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .data_root("data")
//!     .output_dir("output")
//!     .years(["2022", "2023"])
//!     .build()?;
//! let mut pipeline = Pipeline::builder().config(config).build()?;
//!
//! for year in ["2022", "2023"] {
//!     pipeline.preprocess(DatasetMode::Training, year)?;
//! }
//! let report = pipeline.merge(DatasetMode::Training)?;
//! println!("{} trips -> {}", report.rows, report.output_file.display());
//! pipeline.ml(DatasetMode::Training)?;
//! ```
//!
//! # Data location
//!
//! Each (mode, year) has a mapping file at
//! `<data_root>/<mode>/<year>/file_dir.json` naming the CSV of every logical
//! table. See [`loader`].
//!
//! # Labeling
//!
//! A visit fails when at least two of its three scores are 3 or lower; a
//! trip fails when at least half of its scorable visits failed. See
//! [`aggregate::visit`].

pub mod aggregate;
pub mod cleaner;
pub mod config;
pub mod encoding;
pub mod error;
pub mod loader;
pub mod merge;
pub mod pipeline;
pub mod records;
pub mod reporting;
pub mod table;
pub mod utils;

// Re-exports for convenient access
pub use aggregate::{
    ActivityHistorySummary, ActivitySpendSummary, LodgingSpendSummary, VisitAggregator,
    VisitSummary,
};
pub use cleaner::DataCleaner;
pub use config::{
    ConfigValidationError, DatasetMode, MoveCountScope, PipelineConfig, PipelineConfigBuilder,
};
pub use encoding::{CategoricalExpander, ExpandedCodes};
pub use error::{PipelineError, Result as PipelineResult, ResultExt};
pub use loader::{DatasetLoader, FileMap, FileMapCache, TableKey};
pub use merge::{DatasetMerger, FeatureRow, FeatureTable, MergeInputs, MergeStats};
pub use pipeline::{OutputLayout, Pipeline, PipelineBuilder};
pub use reporting::{MergeReport, MlReport, PreprocessReport};
