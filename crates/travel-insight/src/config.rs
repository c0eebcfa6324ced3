//! Configuration types for the travel-insight pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! The labeling thresholds are not part of it; they are named constants in
//! [`crate::aggregate::visit`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Visit-area type codes for administrative and transit stops
/// (home, office, transfer points). Their scores do not describe the trip.
pub const DEFAULT_EXCLUDED_VISIT_TYPES: [i64; 3] = [21, 22, 23];

/// Survey years processed by `merge` when none are configured.
pub const DEFAULT_YEARS: [&str; 2] = ["2022", "2023"];

/// Which split of the survey a run operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatasetMode {
    /// Training split
    #[default]
    Training,
    /// Validation split
    Validation,
}

impl DatasetMode {
    /// Directory name used for this mode under the data and output roots.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Validation => "validation",
        }
    }
}

impl fmt::Display for DatasetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Which visits count towards `MOVE_CNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MoveCountScope {
    /// Every visit row of the trip
    #[default]
    AllVisits,
    /// Only visits whose type code is not excluded
    ScoredVisits,
}

/// Configuration for the pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use travel_insight::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .data_root("data")
///     .output_dir("out")
///     .years(["2022", "2023"])
///     .categorical_top_n(10)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root holding `<mode>/<year>/file_dir.json` mapping files.
    /// Default: "data"
    pub data_root: PathBuf,

    /// Root for every artifact written by the pipeline.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Survey years concatenated by the merge step, in order.
    /// Default: ["2022", "2023"]
    pub years: Vec<String>,

    /// Number of most frequent codes kept by the categorical expander.
    /// Default: 10
    pub categorical_top_n: usize,

    /// Delimiter between codes in multi-value columns.
    /// Default: ';'
    pub multi_value_delimiter: char,

    /// Visit-area type codes excluded from failure scoring.
    /// Default: [21, 22, 23]
    pub excluded_visit_types: Vec<i64>,

    /// Which visits count towards the move count.
    /// Default: AllVisits
    pub move_count_scope: MoveCountScope,

    /// Whether to write a JSON report next to each output.
    /// Default: true
    pub emit_reports: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            years: DEFAULT_YEARS.iter().map(|y| y.to_string()).collect(),
            categorical_top_n: 10,
            multi_value_delimiter: ';',
            excluded_visit_types: DEFAULT_EXCLUDED_VISIT_TYPES.to_vec(),
            move_count_scope: MoveCountScope::default(),
            emit_reports: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::InvalidConfig(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.years.is_empty() {
            return Err(ConfigValidationError::NoYears);
        }

        if let Some(year) = self.years.iter().find(|y| y.trim().is_empty()) {
            return Err(ConfigValidationError::InvalidYear(year.clone()));
        }

        for (i, year) in self.years.iter().enumerate() {
            if self.years[..i].contains(year) {
                return Err(ConfigValidationError::DuplicateYear(year.clone()));
            }
        }

        if self.categorical_top_n == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.categorical_top_n));
        }

        if self.multi_value_delimiter.is_whitespace() {
            return Err(ConfigValidationError::InvalidDelimiter(
                self.multi_value_delimiter,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("At least one survey year must be configured")]
    NoYears,

    #[error("Invalid survey year: '{0}'")]
    InvalidYear(String),

    #[error("Survey year '{0}' is listed twice")]
    DuplicateYear(String),

    #[error("Invalid categorical top-n: {0} (must be at least 1)")]
    InvalidTopN(usize),

    #[error("Invalid multi-value delimiter: {0:?}")]
    InvalidDelimiter(char),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    data_root: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    years: Option<Vec<String>>,
    categorical_top_n: Option<usize>,
    multi_value_delimiter: Option<char>,
    excluded_visit_types: Option<Vec<i64>>,
    move_count_scope: Option<MoveCountScope>,
    emit_reports: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Start from an existing configuration (e.g. one loaded from JSON).
    pub fn from_config(config: PipelineConfig) -> Self {
        Self {
            data_root: Some(config.data_root),
            output_dir: Some(config.output_dir),
            years: Some(config.years),
            categorical_top_n: Some(config.categorical_top_n),
            multi_value_delimiter: Some(config.multi_value_delimiter),
            excluded_visit_types: Some(config.excluded_visit_types),
            move_count_scope: Some(config.move_count_scope),
            emit_reports: Some(config.emit_reports),
        }
    }

    /// Set the root directory holding the mapping files.
    pub fn data_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_root = Some(path.into());
        self
    }

    /// Set the output directory for every artifact.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the survey years merged together, in order.
    pub fn years<I, S>(mut self, years: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.years = Some(years.into_iter().map(Into::into).collect());
        self
    }

    /// Set how many codes the categorical expander keeps.
    pub fn categorical_top_n(mut self, top_n: usize) -> Self {
        self.categorical_top_n = Some(top_n);
        self
    }

    /// Set the delimiter for multi-value code columns.
    pub fn multi_value_delimiter(mut self, delimiter: char) -> Self {
        self.multi_value_delimiter = Some(delimiter);
        self
    }

    /// Set the visit-area type codes excluded from scoring.
    pub fn excluded_visit_types(mut self, codes: impl Into<Vec<i64>>) -> Self {
        self.excluded_visit_types = Some(codes.into());
        self
    }

    /// Set which visits count towards the move count.
    pub fn move_count_scope(mut self, scope: MoveCountScope) -> Self {
        self.move_count_scope = Some(scope);
        self
    }

    /// Enable or disable JSON run reports.
    pub fn emit_reports(mut self, emit: bool) -> Self {
        self.emit_reports = Some(emit);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            data_root: self.data_root.unwrap_or(defaults.data_root),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            years: self.years.unwrap_or(defaults.years),
            categorical_top_n: self.categorical_top_n.unwrap_or(defaults.categorical_top_n),
            multi_value_delimiter: self
                .multi_value_delimiter
                .unwrap_or(defaults.multi_value_delimiter),
            excluded_visit_types: self
                .excluded_visit_types
                .unwrap_or(defaults.excluded_visit_types),
            move_count_scope: self.move_count_scope.unwrap_or_default(),
            emit_reports: self.emit_reports.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}

static_assertions::assert_impl_all!(PipelineConfig: Send, Sync);
