//! Where each stage reads and writes its artifacts.

use crate::config::DatasetMode;
use crate::loader::TableKey;
use std::path::{Path, PathBuf};

pub const FEATURE_TABLE_FILE: &str = "travel_insight.csv";
pub const ML_TABLE_FILE: &str = "travel_ml.csv";
pub const ML_ENCODER_FILE: &str = "ml_encoders.json";
pub const LODGING_ENCODING_FILE: &str = "lodging_encoding.json";

/// Per-year summary artifacts written by `preprocess`.
pub const VISIT_SUMMARY_FILE: &str = "visit_area_summary.csv";
pub const ACTIVITY_SPEND_FILE: &str = "activity_consumption_summary.csv";
pub const ACTIVITY_HISTORY_FILE: &str = "activity_history_summary.csv";
pub const LODGING_SPEND_FILE: &str = "lodging_consumption_summary.csv";

/// Output directory tree:
///
/// ```text
/// <root>/<mode>/<year>/preprocessing/<table>.csv
/// <root>/<mode>/<year>/json/lodging_encoding.json
/// <root>/<mode>/final/travel_insight.csv
/// <root>/<mode>/final/travel_ml.csv
/// <root>/<mode>/reports/<stage>_report.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode_dir(&self, mode: DatasetMode) -> PathBuf {
        self.root.join(mode.dir_name())
    }

    pub fn preprocessing_dir(&self, mode: DatasetMode, year: &str) -> PathBuf {
        self.mode_dir(mode).join(year).join("preprocessing")
    }

    /// Cleaned copy of a raw table.
    pub fn preprocessed_table(&self, mode: DatasetMode, year: &str, key: TableKey) -> PathBuf {
        self.preprocessing_dir(mode, year)
            .join(format!("{}.csv", key.as_str()))
    }

    pub fn summary_file(&self, mode: DatasetMode, year: &str, file_name: &str) -> PathBuf {
        self.preprocessing_dir(mode, year).join(file_name)
    }

    pub fn lodging_encoding(&self, mode: DatasetMode, year: &str) -> PathBuf {
        self.mode_dir(mode)
            .join(year)
            .join("json")
            .join(LODGING_ENCODING_FILE)
    }

    pub fn final_dir(&self, mode: DatasetMode) -> PathBuf {
        self.mode_dir(mode).join("final")
    }

    pub fn feature_table(&self, mode: DatasetMode) -> PathBuf {
        self.final_dir(mode).join(FEATURE_TABLE_FILE)
    }

    pub fn ml_table(&self, mode: DatasetMode) -> PathBuf {
        self.final_dir(mode).join(ML_TABLE_FILE)
    }

    pub fn ml_encoders(&self, mode: DatasetMode) -> PathBuf {
        self.final_dir(mode).join(ML_ENCODER_FILE)
    }

    pub fn reports_dir(&self, mode: DatasetMode) -> PathBuf {
        self.mode_dir(mode).join("reports")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = OutputLayout::new("out");
        assert_eq!(
            layout.preprocessed_table(DatasetMode::Training, "2022", TableKey::TravellerMaster),
            PathBuf::from("out/training/2022/preprocessing/traveller_master.csv")
        );
        assert_eq!(
            layout.feature_table(DatasetMode::Validation),
            PathBuf::from("out/validation/final/travel_insight.csv")
        );
        assert_eq!(
            layout.lodging_encoding(DatasetMode::Training, "2023"),
            PathBuf::from("out/training/2023/json/lodging_encoding.json")
        );
    }
}
