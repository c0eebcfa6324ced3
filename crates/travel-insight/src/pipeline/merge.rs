//! `merge`: combine the preprocessed tables of every configured year into
//! the final feature table.

use super::Pipeline;
use crate::config::DatasetMode;
use crate::error::{PipelineError, Result, ResultExt};
use crate::loader::TableKey;
use crate::merge::{MergeInputs, concat_years};
use crate::records::{
    ActivityEventTable, ActivityPaymentTable, LodgingPaymentTable, TravelerTable, TripTable,
    VisitTable,
};
use crate::reporting::{MergeReport, timestamp};
use crate::table::{column_names, read_csv, write_csv};
use polars::prelude::DataFrame;
use std::time::Instant;
use tracing::info;

/// Stage that produces the preprocessed artifacts `merge` reads.
const PREPROCESS_STEP: &str = "preprocess";

impl Pipeline {
    /// Build `final/travel_insight.csv` for the mode.
    pub fn merge(&self, mode: DatasetMode) -> Result<MergeReport> {
        let start = Instant::now();
        info!("Merging {} years {:?}", mode, self.config.years);

        let mut per_year = Vec::with_capacity(self.config.years.len());
        for year in &self.config.years {
            per_year.push(self.load_preprocessed(mode, year)?);
        }
        let inputs: MergeInputs = concat_years(per_year);

        let outcome = self.merger.merge(inputs);
        let mut df = outcome.table.to_frame()?;
        let path = self.layout.feature_table(mode);
        write_csv(&mut df, &path).context("writing feature table")?;
        info!(
            "Wrote {} ({} rows x {} cols)",
            path.display(),
            df.height(),
            df.width()
        );

        let report = MergeReport {
            generated_at: timestamp(),
            mode,
            years: self.config.years.clone(),
            duration_ms: Self::elapsed_ms(start),
            output_file: path,
            rows: df.height(),
            columns: column_names(&df),
            stats: outcome.stats,
            purpose_codes: outcome.purpose_codes,
            mission_codes: outcome.mission_codes,
        };
        self.emit_report(&report, mode, "merge");
        Ok(report)
    }

    /// Typed tables of one preprocessed year.
    fn load_preprocessed(&self, mode: DatasetMode, year: &str) -> Result<MergeInputs> {
        let context = |key: TableKey| format!("parsing preprocessed {} table for {}", key, year);

        Ok(MergeInputs {
            trips: TripTable::from_frame(&self.read_artifact(mode, year, TableKey::Travel)?)
                .context(context(TableKey::Travel))?,
            visits: VisitTable::from_frame(&self.read_artifact(mode, year, TableKey::VisitAreaInfo)?)
                .context(context(TableKey::VisitAreaInfo))?,
            activity_payments: ActivityPaymentTable::from_frame(
                &self.read_artifact(mode, year, TableKey::ActivityConsumption)?,
            )
            .context(context(TableKey::ActivityConsumption))?,
            activity_events: ActivityEventTable::from_frame(
                &self.read_artifact(mode, year, TableKey::ActivityHistory)?,
            )
            .context(context(TableKey::ActivityHistory))?,
            lodging_payments: LodgingPaymentTable::from_frame(
                &self.read_artifact(mode, year, TableKey::LodgingConsumption)?,
            )
            .context(context(TableKey::LodgingConsumption))?,
            travelers: TravelerTable::from_frame(
                &self.read_artifact(mode, year, TableKey::TravellerMaster)?,
            )
            .context(context(TableKey::TravellerMaster))?,
        })
    }

    fn read_artifact(&self, mode: DatasetMode, year: &str, key: TableKey) -> Result<DataFrame> {
        let path = self.layout.preprocessed_table(mode, year, key);
        if !path.exists() {
            return Err(PipelineError::MissingArtifact {
                path,
                step: PREPROCESS_STEP.to_string(),
            });
        }
        read_csv(&path)
    }
}
