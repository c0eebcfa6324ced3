//! `ml`: encode the feature table for model training.

use super::Pipeline;
use crate::config::DatasetMode;
use crate::encoding::{CategoryMapping, CodedColumn, ScaledColumn};
use crate::error::{PipelineError, Result, ResultExt};
use crate::reporting::{MlReport, timestamp};
use crate::table::{has_column, put_f64_column, put_i64_column, read_csv, string_cells, write_csv};
use crate::utils::parse_numeric_string;
use polars::prelude::DataFrame;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::time::Instant;
use tracing::{info, warn};

/// Categorical columns label-encoded into `{col}_CODE`.
pub const CODED_COLUMNS: [&str; 3] = ["TRAVEL_STATUS_ACCOMPANY", "MVMN_NM", "GENDER"];

/// Numeric columns standardized into `{col}_SCALED`.
pub const SCALED_COLUMNS: [&str; 17] = [
    "activity_payment_sum",
    "activity_payment_count",
    "activity_store_count",
    "activity_history_rows",
    "activity_type_unique",
    "lodging_payment_sum",
    "lodging_payment_count",
    "lodging_store_count",
    "visit_trip_days",
    "visit_move_cnt",
    "AGE_GRP",
    "FAMILY_MEMB",
    "INCOME",
    "HOUSE_INCOME",
    "TRAVEL_TERM",
    "TRAVEL_NUM",
    "TRAVEL_COMPANIONS_NUM",
];

const MERGE_STEP: &str = "merge";

/// Everything needed to encode new data the same way.
#[derive(Debug, Default, Serialize)]
pub struct MlEncoders {
    pub label_encoders: BTreeMap<String, CategoryMapping>,
    pub scalers: BTreeMap<String, ScaledColumn>,
}

/// Add the `_CODE` and `_SCALED` columns to a feature frame. Returns the
/// fitted encoders and the expected columns that were skipped.
pub fn encode_features(df: &mut DataFrame) -> Result<(MlEncoders, Vec<String>)> {
    let mut encoders = MlEncoders::default();
    let mut skipped = Vec::new();

    for name in CODED_COLUMNS {
        if !has_column(df, name) {
            warn!("Column '{}' not found; no {}_CODE column", name, name);
            skipped.push(name.to_string());
            continue;
        }
        let coded = CodedColumn::fit_transform(name, &string_cells(df, name)?);
        put_i64_column(df, &coded.output_name(), coded.codes.iter().copied().map(Some).collect())?;
        encoders
            .label_encoders
            .insert(name.to_string(), coded.encoder.mapping().clone());
    }

    for name in SCALED_COLUMNS {
        if !has_column(df, name) {
            warn!("Column '{}' not found; no {}_SCALED column", name, name);
            skipped.push(name.to_string());
            continue;
        }
        let values: Vec<Option<f64>> = string_cells(df, name)?
            .iter()
            .map(|cell| cell.as_deref().and_then(parse_numeric_string))
            .collect();
        let Some(scaled) = ScaledColumn::median_fill_scale(name, &values) else {
            warn!("Column '{}' has no numeric value; not scaled", name);
            skipped.push(name.to_string());
            continue;
        };
        put_f64_column(df, &scaled.output_name(), scaled.values.clone())?;
        encoders.scalers.insert(name.to_string(), scaled);
    }

    Ok((encoders, skipped))
}

impl Pipeline {
    /// Build `final/travel_ml.csv` and the encoder JSON from the feature
    /// table written by `merge`.
    pub fn ml(&self, mode: DatasetMode) -> Result<MlReport> {
        let start = Instant::now();
        let input = self.layout.feature_table(mode);
        if !input.exists() {
            return Err(PipelineError::MissingArtifact {
                path: input,
                step: MERGE_STEP.to_string(),
            });
        }
        info!("Encoding {} for training", input.display());

        let mut df = read_csv(&input)?;
        let (encoders, skipped_columns) = encode_features(&mut df).context("encoding features")?;

        let output = self.layout.ml_table(mode);
        write_csv(&mut df, &output).context("writing ML table")?;
        let encoder_file = self.layout.ml_encoders(mode);
        fs::write(&encoder_file, serde_json::to_string_pretty(&encoders)?)?;
        info!("Wrote {} and {}", output.display(), encoder_file.display());

        let report = MlReport {
            generated_at: timestamp(),
            mode,
            duration_ms: Self::elapsed_ms(start),
            input_file: input,
            output_file: output,
            encoder_file,
            rows: df.height(),
            coded_columns: encoders.label_encoders.keys().map(|c| format!("{}_CODE", c)).collect(),
            scaled_columns: encoders.scalers.keys().map(|c| format!("{}_SCALED", c)).collect(),
            skipped_columns,
        };
        self.emit_report(&report, mode, "ml");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column_names;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_features() {
        let mut df = df![
            "TRAVEL_ID" => ["a", "b", "c"],
            "GENDER" => [Some("여"), Some("남"), None],
            "activity_payment_sum" => ["1000", "3000", "2000"],
            "AGE_GRP" => ["30", "30", "30"],
        ]
        .unwrap();

        let (encoders, skipped) = encode_features(&mut df).unwrap();
        let names = column_names(&df);
        assert!(names.contains(&"GENDER_CODE".to_string()));
        assert!(names.contains(&"activity_payment_sum_SCALED".to_string()));
        assert!(skipped.contains(&"MVMN_NM".to_string()));

        // __NaN__ = 0, then 남, 여
        let codes: Vec<Option<i64>> = df.column("GENDER_CODE").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(codes, vec![Some(2), Some(1), Some(0)]);

        // zero variance scales to 0
        let age: Vec<Option<f64>> = df.column("AGE_GRP_SCALED").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(age, vec![Some(0.0); 3]);

        let scaler = &encoders.scalers["activity_payment_sum"];
        assert_eq!(scaler.scaler.mean, 2000.0);
    }
}
