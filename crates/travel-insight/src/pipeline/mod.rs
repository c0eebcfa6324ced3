//! Pipeline module.
//!
//! The three stages, each writing its artifacts under [`OutputLayout`]:
//! - [`Pipeline::preprocess`]: clean the raw tables of one (mode, year)
//! - [`Pipeline::merge`]: build the per-trip feature table over all years
//! - [`Pipeline::ml`]: add label-encoded and scaled columns for training

mod builder;
pub mod layout;
mod merge;
pub mod ml;
mod preprocess;

pub use builder::{Pipeline, PipelineBuilder};
pub use layout::OutputLayout;
pub use ml::{MlEncoders, encode_features};
