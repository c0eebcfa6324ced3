//! Integration tests for the travel-insight pipeline.
//!
//! These tests run the preprocess, merge and ml stages end to end over the
//! two survey years under `tests/fixtures/data`.

use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use travel_insight::table::{column_names, read_csv, string_cells};
use travel_insight::{DatasetMode, Pipeline, PipelineConfig, PipelineError, TableKey};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data")
}

fn pipeline(output: &Path) -> Pipeline {
    let config = PipelineConfig::builder()
        .data_root(fixtures_path())
        .output_dir(output)
        .years(["2022", "2023"])
        .categorical_top_n(2)
        .emit_reports(false)
        .build()
        .unwrap();
    Pipeline::builder().config(config).build().unwrap()
}

fn run_all(output: &Path) -> Pipeline {
    let mut pipeline = pipeline(output);
    pipeline.preprocess(DatasetMode::Training, "2022").unwrap();
    pipeline.preprocess(DatasetMode::Training, "2023").unwrap();
    pipeline.merge(DatasetMode::Training).unwrap();
    pipeline
}

/// Final feature table with every cell as text.
fn feature_table(pipeline: &Pipeline) -> DataFrame {
    read_csv(&pipeline.layout().feature_table(DatasetMode::Training)).unwrap()
}

fn column(df: &DataFrame, name: &str) -> Vec<String> {
    string_cells(df, name)
        .unwrap()
        .into_iter()
        .map(|cell| cell.unwrap_or_default())
        .collect()
}

fn numbers(df: &DataFrame, name: &str) -> Vec<f64> {
    column(df, name)
        .iter()
        .map(|cell| cell.parse::<f64>().unwrap())
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

// ============================================================================
// Preprocess
// ============================================================================

#[test]
fn test_preprocess_writes_every_table() {
    let out = TempDir::new().unwrap();
    let mut pipeline = pipeline(out.path());

    let report = pipeline.preprocess(DatasetMode::Training, "2022").unwrap();
    assert_eq!(report.tables.len(), 6);
    for key in TableKey::ALL {
        let path = pipeline
            .layout()
            .preprocessed_table(DatasetMode::Training, "2022", key);
        assert!(path.exists(), "{} missing", path.display());
    }
    assert_eq!(report.summary_files.len(), 4);
    assert!(report.encoding_file.as_ref().is_some_and(|p| p.exists()));

    let travel = read_csv(
        &pipeline
            .layout()
            .preprocessed_table(DatasetMode::Training, "2022", TableKey::Travel),
    )
    .unwrap();
    let names = column_names(&travel);
    assert!(!names.contains(&"TRAVEL_NM".to_string()));
    assert!(!names.contains(&"TRAVEL_MISSION".to_string()));
    assert_eq!(column(&travel, "MVMN_NM")[1], "정보없음");
}

#[test]
fn test_preprocess_visit_summary() {
    let out = TempDir::new().unwrap();
    let mut pipeline = pipeline(out.path());
    pipeline.preprocess(DatasetMode::Training, "2022").unwrap();

    let summary = read_csv(&pipeline.layout().summary_file(
        DatasetMode::Training,
        "2022",
        "visit_area_summary.csv",
    ))
    .unwrap();
    assert_eq!(column(&summary, "TRAVEL_ID"), vec!["a_1", "a_2", "a_3"]);
    // three (2,5,1) visits and one (5,5,5): ratio 0.75
    assert_eq!(column(&summary, "IS_FAILED_TRIP"), vec!["1", "0", "0"]);
    // the home visit counts as a move but is not scored
    assert_eq!(column(&summary, "MOVE_CNT"), vec!["5", "2", "1"]);
}

#[test]
fn test_preprocess_activity_summary_repairs_bad_amounts() {
    let out = TempDir::new().unwrap();
    let mut pipeline = pipeline(out.path());
    pipeline.preprocess(DatasetMode::Training, "2022").unwrap();

    let summary = read_csv(&pipeline.layout().summary_file(
        DatasetMode::Training,
        "2022",
        "activity_consumption_summary.csv",
    ))
    .unwrap();
    // "1000" and "abc" for a_1
    assert_eq!(column(&summary, "TRAVEL_ID"), vec!["a_1", "a_2"]);
    assert_eq!(column(&summary, "activity_payment_sum"), vec!["1000", "3000"]);
    assert_eq!(column(&summary, "activity_payment_count"), vec!["2", "1"]);
}

#[test]
fn test_preprocess_unknown_year_is_a_configuration_error() {
    let out = TempDir::new().unwrap();
    let mut pipeline = pipeline(out.path());

    let err = pipeline
        .preprocess(DatasetMode::Training, "2019")
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingMappingFile(_)));
    assert!(err.is_configuration());
}

// ============================================================================
// Merge
// ============================================================================

#[test]
fn test_merge_one_row_per_trip() {
    let out = TempDir::new().unwrap();
    let pipeline = run_all(out.path());
    let df = feature_table(&pipeline);

    // a_1 appears in both years; the 2022 trip wins
    assert_eq!(column(&df, "TRAVEL_ID"), vec!["a_1", "a_2", "a_3", "b_1"]);
    assert_eq!(column(&df, "TRAVEL_LENGTH"), vec!["2", "1", "0", "3"]);
    assert_eq!(column(&df, "SEASON"), vec!["3", "2", "4", "1"]);
}

#[test]
fn test_merge_label() {
    let out = TempDir::new().unwrap();
    let df = feature_table(&run_all(out.path()));

    assert_eq!(column(&df, "IS_FAILED_TRIP"), vec!["1", "0", "0", "1"]);
}

#[test]
fn test_merge_imputation() {
    let out = TempDir::new().unwrap();
    let df = feature_table(&run_all(out.path()));

    // a_3 has no activity payments: median of 1000, 3000, 12000
    assert_eq!(
        column(&df, "activity_payment_sum"),
        vec!["1000", "3000", "3000", "12000"]
    );
    assert_eq!(column(&df, "activity_payment_count"), vec!["2", "1", "0", "1"]);
    // a_2 and b_1 have no lodging: median of 100000 and 50000
    assert_eq!(
        column(&df, "lodging_payment_sum"),
        vec!["100000", "75000", "50000", "75000"]
    );
    assert_eq!(column(&df, "lodging_store_count"), vec!["1", "0", "1", "0"]);
}

#[test]
fn test_merge_ratios() {
    let out = TempDir::new().unwrap();
    let df = feature_table(&run_all(out.path()));

    let per_day = numbers(&df, "payment_sum_per_day");
    assert_close(per_day[0], 101_000.0 / 2.0);
    // a_3 ends before it starts
    assert_close(per_day[2], 0.0);
    assert_close(numbers(&df, "move_cnt_per_day")[2], 0.0);
    assert_close(numbers(&df, "activity_rows_per_day")[0], 1.5);
    assert_close(
        numbers(&df, "activity_lodging_spend_ratio")[0],
        1000.0 / 100_001.0,
    );

    let companions = numbers(&df, "companions_per_family");
    assert_close(companions[0], 0.5);
    // zero family members reads as 1
    assert_close(companions[1], 3.0);
}

#[test]
fn test_merge_expands_multi_value_columns() {
    let out = TempDir::new().unwrap();
    let df = feature_table(&run_all(out.path()));

    assert_eq!(column(&df, "TRAVEL_PURPOSE_1"), vec!["1", "0", "1", "0"]);
    assert_eq!(column(&df, "TRAVEL_PURPOSE_2"), vec!["1", "1", "0", "0"]);
    assert_eq!(column(&df, "TRAVEL_PURPOSE_OTHER"), vec!["0", "0", "1", "1"]);
    assert_eq!(column(&df, "TRAVEL_PURPOSE_COUNT"), vec!["2", "1", "2", "1"]);
    // 2023 has no mission column
    assert_eq!(column(&df, "TRAVEL_MISSION_CHECK_COUNT"), vec!["2", "1", "1", "0"]);
}

#[test]
fn test_merge_drops_leakage_columns() {
    let out = TempDir::new().unwrap();
    let df = feature_table(&run_all(out.path()));
    let names = column_names(&df);

    for leaked in [
        "TRAVELER_ID",
        "TRAVEL_NM",
        "TRAVEL_MISSION",
        "TRAVEL_PURPOSE",
        "TRAVEL_MISSION_CHECK",
        "TRAVEL_START_YMD",
        "TRAVEL_END_YMD",
        "TRAVEL_STATUS_YMD",
        "DGSTFN_AVG",
        "REVISIT_AVG",
        "RCMDTN_AVG",
    ] {
        assert!(!names.contains(&leaked.to_string()), "{} leaked", leaked);
    }
    assert!(names.contains(&"GENDER".to_string()));
    assert!(names.contains(&"TRAVEL_STATUS_RESIDENCE_CODE".to_string()));
    let nulls: usize = df.get_columns().iter().map(|c| c.null_count()).sum();
    assert_eq!(nulls, 0);
}

#[test]
fn test_merge_report() {
    let out = TempDir::new().unwrap();
    let mut pipeline = pipeline(out.path());
    pipeline.preprocess(DatasetMode::Training, "2022").unwrap();
    pipeline.preprocess(DatasetMode::Training, "2023").unwrap();

    let report = pipeline.merge(DatasetMode::Training).unwrap();
    assert_eq!(report.rows, 4);
    assert_eq!(report.stats.base_trips, 4);
    assert_eq!(report.stats.duplicate_trips, 1);
    assert_eq!(report.stats.lodging_sum_imputed, 2);
    assert_eq!(report.stats.incomplete_rows_dropped, 0);
    let purpose = report.purpose_codes.unwrap();
    assert_eq!(purpose.top_codes, vec!["1", "2"]);
}

#[test]
fn test_merge_without_preprocess_names_the_step() {
    let out = TempDir::new().unwrap();
    let mut pipeline = pipeline(out.path());
    pipeline.preprocess(DatasetMode::Training, "2022").unwrap();

    let err = pipeline.merge(DatasetMode::Training).unwrap_err();
    match &err {
        PipelineError::MissingArtifact { path, step } => {
            assert!(path.to_string_lossy().contains("2023"));
            assert_eq!(step, "preprocess");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(err.error_code(), "MISSING_ARTIFACT");
}

#[test]
fn test_rerun_is_byte_identical() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let a = run_all(first.path());
    let b = run_all(second.path());
    a.ml(DatasetMode::Training).unwrap();
    b.ml(DatasetMode::Training).unwrap();

    let read = |path: PathBuf| std::fs::read(path).unwrap();
    assert_eq!(
        read(a.layout().feature_table(DatasetMode::Training)),
        read(b.layout().feature_table(DatasetMode::Training))
    );
    assert_eq!(
        read(a.layout().ml_table(DatasetMode::Training)),
        read(b.layout().ml_table(DatasetMode::Training))
    );
}

// ============================================================================
// ML encoding
// ============================================================================

#[test]
fn test_ml_adds_code_and_scaled_columns() {
    let out = TempDir::new().unwrap();
    let pipeline = run_all(out.path());

    let report = pipeline.ml(DatasetMode::Training).unwrap();
    assert_eq!(report.rows, 4);
    assert!(report.skipped_columns.is_empty());
    assert!(report.encoder_file.exists());

    let df = read_csv(&pipeline.layout().ml_table(DatasetMode::Training)).unwrap();
    let names = column_names(&df);
    for name in ["GENDER_CODE", "MVMN_NM_CODE", "TRAVEL_STATUS_ACCOMPANY_CODE"] {
        assert!(names.contains(&name.to_string()), "{} missing", name);
    }
    // 남 < 여 after the reserved __NaN__ slot
    assert_eq!(column(&df, "GENDER_CODE"), vec!["1", "2", "1", "2"]);

    let scaled = numbers(&df, "lodging_payment_sum_SCALED");
    let mean: f64 = scaled.iter().sum::<f64>() / scaled.len() as f64;
    assert_close(mean, 0.0);
}

#[test]
fn test_ml_without_merge_names_the_step() {
    let out = TempDir::new().unwrap();
    let err = pipeline(out.path()).ml(DatasetMode::Validation).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::MissingArtifact { ref step, .. } if step == "merge"
    ));
}
