//! Dataset loading.
//!
//! Each (mode, year) pair has a `file_dir.json` mapping file that maps
//! logical table names to CSV paths:
//!
//! ```json
//! {
//!   "travel": "raw/tn_travel.csv",
//!   "visit_area_info": "raw/tn_visit_area_info.csv"
//! }
//! ```
//!
//! Relative paths resolve against the directory of the mapping file. The
//! original Korean table names are accepted as aliases. Mapping files are
//! parsed once per process and cached in a [`FileMapCache`] owned by the
//! [`DatasetLoader`]; a loaded [`FileMap`] is never mutated.

use crate::config::DatasetMode;
use crate::error::{PipelineError, Result, ResultExt};
use crate::table::read_csv;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the mapping file inside `<data_root>/<mode>/<year>/`.
pub const MAPPING_FILE_NAME: &str = "file_dir.json";

/// Logical tables of the travel survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKey {
    /// One row per trip
    Travel,
    /// One row per visited area
    VisitAreaInfo,
    /// Payments made during activities
    ActivityConsumption,
    /// Logged activities
    ActivityHistory,
    /// Lodging payments
    LodgingConsumption,
    /// Traveler demographics
    TravellerMaster,
}

impl TableKey {
    /// Every logical table, in dependency order.
    pub const ALL: [TableKey; 6] = [
        TableKey::Travel,
        TableKey::VisitAreaInfo,
        TableKey::ActivityConsumption,
        TableKey::ActivityHistory,
        TableKey::LodgingConsumption,
        TableKey::TravellerMaster,
    ];

    /// Key used in mapping files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Travel => "travel",
            Self::VisitAreaInfo => "visit_area_info",
            Self::ActivityConsumption => "activity_consumption",
            Self::ActivityHistory => "activity_history",
            Self::LodgingConsumption => "lodging_consumption",
            Self::TravellerMaster => "traveller_master",
        }
    }

    /// Name used by the survey's own file listings.
    pub fn survey_alias(&self) -> &'static str {
        match self {
            Self::Travel => "여행",
            Self::VisitAreaInfo => "방문지정보",
            Self::ActivityConsumption => "활동소비내역",
            Self::ActivityHistory => "활동내역",
            Self::LodgingConsumption => "숙박소비내역",
            Self::TravellerMaster => "여행객_Master",
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed contents of one mapping file.
#[derive(Debug, Clone)]
pub struct FileMap {
    source: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

impl FileMap {
    /// Parse a mapping file; relative paths are resolved against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingMappingFile(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let raw: BTreeMap<String, String> = serde_json::from_str(&content)
            .map_err(PipelineError::from)
            .context(format!("parsing {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let entries = raw
            .into_iter()
            .map(|(key, value)| {
                let target = PathBuf::from(value);
                let resolved = if target.is_absolute() {
                    target
                } else {
                    base.join(target)
                };
                (key, resolved)
            })
            .collect();

        Ok(Self {
            source: path.to_path_buf(),
            entries,
        })
    }

    /// Path of the mapping file this map was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Resolve a logical table to its file path.
    pub fn resolve(&self, key: TableKey) -> Result<&Path> {
        self.entries
            .get(key.as_str())
            .or_else(|| self.entries.get(key.survey_alias()))
            .map(PathBuf::as_path)
            .ok_or_else(|| PipelineError::UnknownTableKey {
                key: key.as_str().to_string(),
                available: self.entries.keys().cloned().collect::<Vec<_>>().join(", "),
            })
    }
}

/// Memoized mapping files keyed by (mode, year).
#[derive(Debug, Default)]
pub struct FileMapCache {
    maps: HashMap<(DatasetMode, String), FileMap>,
}

impl FileMapCache {
    /// Return the cached map, loading it from `path` on first use.
    pub fn get_or_load(&mut self, mode: DatasetMode, year: &str, path: &Path) -> Result<&FileMap> {
        let key = (mode, year.to_string());
        if !self.maps.contains_key(&key) {
            let map = FileMap::load(path)?;
            debug!("Cached mapping file {}", path.display());
            self.maps.insert(key.clone(), map);
        }
        Ok(&self.maps[&key])
    }

    /// Number of cached mapping files.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Whether no mapping file has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

/// Reads raw survey tables by logical name.
#[derive(Debug)]
pub struct DatasetLoader {
    data_root: PathBuf,
    cache: FileMapCache,
}

static_assertions::assert_impl_all!(DatasetLoader: Send, Sync);

impl DatasetLoader {
    /// Create a loader rooted at `data_root`.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            cache: FileMapCache::default(),
        }
    }

    /// Location of the mapping file for (mode, year).
    pub fn mapping_path(&self, mode: DatasetMode, year: &str) -> PathBuf {
        self.data_root
            .join(mode.dir_name())
            .join(year)
            .join(MAPPING_FILE_NAME)
    }

    /// Mapping for (mode, year), loaded on first access.
    pub fn file_map(&mut self, mode: DatasetMode, year: &str) -> Result<&FileMap> {
        let path = self.mapping_path(mode, year);
        self.cache.get_or_load(mode, year, &path)
    }

    /// Resolve and read one raw table.
    pub fn load(&mut self, mode: DatasetMode, year: &str, key: TableKey) -> Result<DataFrame> {
        let path = self.file_map(mode, year)?.resolve(key)?.to_path_buf();
        info!("Loading {} table for {}/{} from {}", key, mode, year, path.display());
        read_csv(&path).context(format!("loading {} table", key))
    }

    /// The mapping cache (read-only view).
    pub fn cache(&self) -> &FileMapCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_mapping(root: &Path, mode: DatasetMode, year: &str, json: &str) -> PathBuf {
        let dir = root.join(mode.dir_name()).join(year);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(MAPPING_FILE_NAME);
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_resolve_relative_and_alias_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mapping(
            dir.path(),
            DatasetMode::Training,
            "2022",
            r#"{"travel": "raw/travel.csv", "방문지정보": "/abs/visit.csv"}"#,
        );

        let map = FileMap::load(&path).unwrap();
        assert_eq!(
            map.resolve(TableKey::Travel).unwrap(),
            path.parent().unwrap().join("raw/travel.csv")
        );
        assert_eq!(
            map.resolve(TableKey::VisitAreaInfo).unwrap(),
            Path::new("/abs/visit.csv")
        );
    }

    #[test]
    fn test_unknown_key_lists_available() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mapping(
            dir.path(),
            DatasetMode::Training,
            "2022",
            r#"{"travel": "t.csv"}"#,
        );
        let map = FileMap::load(&path).unwrap();
        let err = map.resolve(TableKey::LodgingConsumption).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("lodging_consumption"));
        assert!(message.contains("travel"));
    }

    #[test]
    fn test_missing_mapping_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = DatasetLoader::new(dir.path());
        let err = loader
            .load(DatasetMode::Validation, "2023", TableKey::Travel)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingMappingFile(_)));
        assert!(err.to_string().contains("validation"));
    }

    #[test]
    fn test_cache_loads_each_mapping_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mapping(
            dir.path(),
            DatasetMode::Training,
            "2022",
            r#"{"travel": "t.csv"}"#,
        );
        let mut loader = DatasetLoader::new(dir.path());
        loader.file_map(DatasetMode::Training, "2022").unwrap();

        // the cached map survives the file disappearing
        fs::remove_file(&path).unwrap();
        assert!(loader.file_map(DatasetMode::Training, "2022").is_ok());
        assert_eq!(loader.cache().len(), 1);
    }

    #[test]
    fn test_load_missing_source_file() {
        let dir = tempfile::tempdir().unwrap();
        write_mapping(
            dir.path(),
            DatasetMode::Training,
            "2022",
            r#"{"travel": "missing.csv"}"#,
        );
        let mut loader = DatasetLoader::new(dir.path());
        let err = loader
            .load(DatasetMode::Training, "2022", TableKey::Travel)
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FILE");
        assert!(err.to_string().contains("missing.csv"));
    }
}
