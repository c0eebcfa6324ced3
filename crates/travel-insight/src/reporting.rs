//! Run reports.
//!
//! Every stage returns a serializable report. The CLI prints it with
//! `--json`, and when [`crate::config::PipelineConfig::emit_reports`] is set
//! the stage also writes it as `<output>/<mode>/reports/<name>_report.json`.

use crate::config::DatasetMode;
use crate::encoding::ExpandedCodes;
use crate::error::Result;
use crate::merge::MergeStats;
use chrono::Local;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Timestamp format shared by every report.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// What happened to one cleaned table.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table: String,
    pub rows: usize,
    pub columns: usize,
    pub output_file: PathBuf,
    /// Cleaning actions, in the order they ran
    pub actions: Vec<String>,
}

/// Report of `preprocess` for one (mode, year).
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessReport {
    pub generated_at: String,
    pub mode: DatasetMode,
    pub year: String,
    pub duration_ms: u64,
    pub tables: Vec<TableReport>,
    pub summary_files: Vec<PathBuf>,
    pub encoding_file: Option<PathBuf>,
}

impl PreprocessReport {
    /// Every file written by the run.
    pub fn output_files(&self) -> Vec<&Path> {
        self.tables
            .iter()
            .map(|t| t.output_file.as_path())
            .chain(self.summary_files.iter().map(PathBuf::as_path))
            .chain(self.encoding_file.as_deref())
            .collect()
    }
}

/// Report of `merge` for one mode.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub generated_at: String,
    pub mode: DatasetMode,
    pub years: Vec<String>,
    pub duration_ms: u64,
    pub output_file: PathBuf,
    pub rows: usize,
    pub columns: Vec<String>,
    pub stats: MergeStats,
    pub purpose_codes: Option<ExpandedCodes>,
    pub mission_codes: Option<ExpandedCodes>,
}

/// Report of `ml` for one mode.
#[derive(Debug, Clone, Serialize)]
pub struct MlReport {
    pub generated_at: String,
    pub mode: DatasetMode,
    pub duration_ms: u64,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub encoder_file: PathBuf,
    pub rows: usize,
    pub coded_columns: Vec<String>,
    pub scaled_columns: Vec<String>,
    /// Columns that were expected but absent or entirely non-numeric
    pub skipped_columns: Vec<String>,
}

/// Write a report as pretty JSON to `<dir>/<name>_report.json`.
pub fn write_report<T: Serialize>(report: &T, dir: &Path, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let report_path = dir.join(format!("{}_report.json", name));
    let mut file = File::create(&report_path)?;
    file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

    info!("Report saved: {}", report_path.display());
    Ok(report_path)
}
