//! The pipeline and its builder.

use crate::cleaner::DataCleaner;
use crate::config::{ConfigValidationError, DatasetMode, PipelineConfig};
use crate::loader::DatasetLoader;
use crate::merge::DatasetMerger;
use crate::pipeline::OutputLayout;
use crate::reporting::write_report;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// Runs the `preprocess`, `merge` and `ml` stages.
///
/// Use [`Pipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use travel_insight::{DatasetMode, Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .data_root("data")
///     .output_dir("output")
///     .build()?;
/// let mut pipeline = Pipeline::builder().config(config).build()?;
///
/// pipeline.preprocess(DatasetMode::Training, "2022")?;
/// pipeline.preprocess(DatasetMode::Training, "2023")?;
/// let merged = pipeline.merge(DatasetMode::Training)?;
/// println!("{} trips", merged.rows);
/// ```
#[derive(Debug)]
pub struct Pipeline {
    pub(crate) config: PipelineConfig,
    pub(crate) loader: DatasetLoader,
    pub(crate) cleaner: DataCleaner,
    pub(crate) merger: DatasetMerger,
    pub(crate) layout: OutputLayout,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Write the stage report when reports are enabled. A failed write is
    /// logged and does not fail the stage.
    pub(crate) fn emit_report<T: Serialize>(&self, report: &T, mode: DatasetMode, name: &str) -> Option<PathBuf> {
        if !self.config.emit_reports {
            return None;
        }
        match write_report(report, &self.layout.reports_dir(mode), name) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Failed to write {} report: {}", name, e);
                None
            }
        }
    }

    pub(crate) fn elapsed_ms(start: std::time::Instant) -> u64 {
        start.elapsed().as_millis() as u64
    }
}

/// Builder for [`Pipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    cleaner: Option<DataCleaner>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a cleaner with non-default settings, e.g. extra activity columns
    /// to drop.
    pub fn cleaner(mut self, cleaner: DataCleaner) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            loader: DatasetLoader::new(config.data_root.clone()),
            cleaner: self.cleaner.unwrap_or_default(),
            merger: DatasetMerger::new(&config),
            layout: OutputLayout::new(config.output_dir.clone()),
            config,
        })
    }
}
