//! `preprocess`: clean the raw tables of one (mode, year) and write the
//! per-year artifacts.

use super::Pipeline;
use super::layout::{
    ACTIVITY_HISTORY_FILE, ACTIVITY_SPEND_FILE, LODGING_SPEND_FILE, VISIT_SUMMARY_FILE,
};
use crate::aggregate::{
    VisitAggregator, activity_history_frame, activity_spend_frame, aggregate_activity_history,
    aggregate_activity_spend, aggregate_lodging_spend, lodging_spend_frame, visit_summary_frame,
};
use crate::config::DatasetMode;
use crate::error::{Result, ResultExt};
use crate::loader::TableKey;
use crate::records::{ActivityEventTable, ActivityPaymentTable, LodgingPaymentTable, VisitTable};
use crate::reporting::{PreprocessReport, TableReport, timestamp};
use crate::table::write_csv;
use polars::prelude::DataFrame;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

impl Pipeline {
    /// Clean every raw table of (mode, year), write the cleaned tables, the
    /// per-trip summaries and the lodging encoder mappings.
    pub fn preprocess(&mut self, mode: DatasetMode, year: &str) -> Result<PreprocessReport> {
        let start = Instant::now();
        info!("Preprocessing {} {}", mode, year);

        let raw_travel = self.loader.load(mode, year, TableKey::Travel)?;
        let raw_visits = self.loader.load(mode, year, TableKey::VisitAreaInfo)?;
        let raw_activity = self.loader.load(mode, year, TableKey::ActivityConsumption)?;
        let raw_history = self.loader.load(mode, year, TableKey::ActivityHistory)?;
        let raw_lodging = self.loader.load(mode, year, TableKey::LodgingConsumption)?;
        let raw_travelers = self.loader.load(mode, year, TableKey::TravellerMaster)?;

        let lodging = self
            .cleaner
            .clean_lodging_consumption(raw_lodging, &raw_travel)
            .context("cleaning lodging_consumption")?;
        let encoding_mappings = lodging.mappings();

        let cleaned = [
            (
                TableKey::Travel,
                self.cleaner.clean_travel(raw_travel).context("cleaning travel")?,
            ),
            (
                TableKey::VisitAreaInfo,
                self.cleaner
                    .clean_visit_area(raw_visits)
                    .context("cleaning visit_area_info")?,
            ),
            (
                TableKey::ActivityConsumption,
                self.cleaner
                    .clean_activity_consumption(raw_activity)
                    .context("cleaning activity_consumption")?,
            ),
            (
                TableKey::ActivityHistory,
                self.cleaner
                    .clean_activity_history(raw_history)
                    .context("cleaning activity_history")?,
            ),
            (TableKey::LodgingConsumption, (lodging.df, lodging.actions)),
            (
                TableKey::TravellerMaster,
                self.cleaner
                    .clean_traveler_master(raw_travelers)
                    .context("cleaning traveller_master")?,
            ),
        ];

        let mut tables = Vec::with_capacity(cleaned.len());
        let mut frames: Vec<(TableKey, DataFrame)> = Vec::with_capacity(cleaned.len());
        for (key, (mut df, actions)) in cleaned {
            for action in &actions {
                debug!("{}: {}", key, action);
            }
            let path = self.layout.preprocessed_table(mode, year, key);
            write_csv(&mut df, &path).context(format!("writing preprocessed {} table", key))?;
            info!("Wrote {} ({} rows)", path.display(), df.height());
            tables.push(TableReport {
                table: key.as_str().to_string(),
                rows: df.height(),
                columns: df.width(),
                output_file: path,
                actions,
            });
            frames.push((key, df));
        }

        let summary_files = self.write_summaries(mode, year, &frames)?;

        let encoding_file = if encoding_mappings.is_empty() {
            None
        } else {
            let path = self.layout.lodging_encoding(mode, year);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, serde_json::to_string_pretty(&encoding_mappings)?)?;
            info!("Wrote {}", path.display());
            Some(path)
        };

        let report = PreprocessReport {
            generated_at: timestamp(),
            mode,
            year: year.to_string(),
            duration_ms: Self::elapsed_ms(start),
            tables,
            summary_files,
            encoding_file,
        };
        self.emit_report(&report, mode, &format!("preprocess_{}", year));
        Ok(report)
    }

    /// Per-trip summaries of one year, for inspection next to the cleaned
    /// tables. `merge` recomputes them over all years.
    fn write_summaries(
        &self,
        mode: DatasetMode,
        year: &str,
        frames: &[(TableKey, DataFrame)],
    ) -> Result<Vec<PathBuf>> {
        let frame_of = |key: TableKey| {
            frames
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, df)| df)
        };
        let mut written = Vec::new();
        let mut write = |file_name: &str, mut df: DataFrame| -> Result<()> {
            let path = self.layout.summary_file(mode, year, file_name);
            write_csv(&mut df, &path)?;
            written.push(path);
            Ok(())
        };

        if let Some(df) = frame_of(TableKey::VisitAreaInfo) {
            let visits = VisitTable::from_frame(df)?;
            let aggregator = VisitAggregator::from_config(&self.config);
            write(VISIT_SUMMARY_FILE, visit_summary_frame(&aggregator.aggregate(&visits))?)?;
        }
        if let Some(df) = frame_of(TableKey::ActivityConsumption) {
            let payments = ActivityPaymentTable::from_frame(df)?;
            write(
                ACTIVITY_SPEND_FILE,
                activity_spend_frame(&aggregate_activity_spend(&payments))?,
            )?;
        }
        if let Some(df) = frame_of(TableKey::ActivityHistory) {
            let events = ActivityEventTable::from_frame(df)?;
            write(
                ACTIVITY_HISTORY_FILE,
                activity_history_frame(&aggregate_activity_history(&events))?,
            )?;
        }
        if let Some(df) = frame_of(TableKey::LodgingConsumption) {
            let payments = LodgingPaymentTable::from_frame(df)?;
            write(
                LODGING_SPEND_FILE,
                lodging_spend_frame(&aggregate_lodging_spend(&payments))?,
            )?;
        }

        Ok(written)
    }
}
