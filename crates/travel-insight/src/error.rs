//! Error types for the travel-insight pipeline.
//!
//! Structural problems (missing mapping files, missing upstream artifacts,
//! unknown table keys) surface as [`PipelineError`] and terminate the current
//! run. Per-row anomalies never reach this type: they are repaired inline by
//! the cleaners and aggregators.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The (mode, year) mapping file does not exist.
    #[error("Mapping file not found: {}", .0.display())]
    MissingMappingFile(PathBuf),

    /// A logical table name is absent from the mapping file.
    #[error("Unknown dataset key '{key}'. Available keys: {available}")]
    UnknownTableKey { key: String, available: String },

    /// A source table referenced by the mapping does not exist on disk.
    #[error("Source file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// An artifact that an earlier stage should have produced is missing.
    #[error("Missing preprocessed file: {} (run `{step}` first)", .path.display())]
    MissingArtifact { path: PathBuf, step: String },

    /// A column the record type cannot do without is absent.
    #[error("Column '{column}' not found in {table} table")]
    ColumnNotFound { table: String, column: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The input data cannot be processed at all.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a missing required column.
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        PipelineError::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Stable error code, used by the `--json` CLI output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingMappingFile(_) => "MISSING_MAPPING_FILE",
            Self::UnknownTableKey { .. } => "UNKNOWN_TABLE_KEY",
            Self::MissingFile(_) => "MISSING_FILE",
            Self::MissingArtifact { .. } => "MISSING_ARTIFACT",
            Self::ColumnNotFound { .. } => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error comes from configuration rather than from data.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::MissingMappingFile(_) | Self::UnknownTableKey { .. } | Self::InvalidConfig(_) => {
                true
            }
            Self::WithContext { source, .. } => source.is_configuration(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            PipelineError::MissingFile(PathBuf::from("a.csv")).error_code(),
            "MISSING_FILE"
        );
        assert_eq!(
            PipelineError::column_not_found("visit", "TRAVEL_ID").error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_missing_artifact_names_path_and_step() {
        let error = PipelineError::MissingArtifact {
            path: PathBuf::from("out/training/2022/preprocessing/travel.csv"),
            step: "preprocess".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("travel.csv"));
        assert!(message.contains("preprocess"));
    }

    #[test]
    fn test_is_configuration() {
        assert!(PipelineError::MissingMappingFile(PathBuf::from("x.json")).is_configuration());
        assert!(
            PipelineError::InvalidConfig("years".into())
                .with_context("loading")
                .is_configuration()
        );
        assert!(!PipelineError::MissingFile(PathBuf::from("x.csv")).is_configuration());
    }

    #[test]
    fn test_error_serialization() {
        let error = PipelineError::UnknownTableKey {
            key: "lodging".to_string(),
            available: "travel".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("UNKNOWN_TABLE_KEY"));
        assert!(json.contains("lodging"));
    }

    #[test]
    fn test_with_context() {
        let error = PipelineError::column_not_found("trip", "TRAVEL_ID").with_context("During merge");
        assert!(error.to_string().contains("During merge"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
    }
}
