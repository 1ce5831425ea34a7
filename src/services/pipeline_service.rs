use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, instrument};

use crate::catalog::{AssetType, LayoutError, SheetLayout};
use crate::config::Config;
use crate::dataset::{Dataset, DatasetAccumulator, ExtractionResult, MergeConflict, MergePolicy};
use crate::extract::{
    extract_sheet, DerivedPeriod, Period, PeriodError, PeriodKeyDeriver, PeriodSource,
};
use crate::importers::{FetchError, Fetcher, GridLoadError, GridLoader};
use crate::output::{Artifacts, OutputComposer, OutputError};

/// Failures that skip a single report
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error(transparent)]
    Period(#[from] PeriodError),

    #[error("Cannot tell ETF from REIT in file name: {file}")]
    UnknownAsset { file: String, period: Period },

    #[error("{source}")]
    Grid {
        period: Period,
        #[source]
        source: GridLoadError,
    },

    #[error(transparent)]
    Conflict(#[from] MergeConflict),
}

impl FileError {
    /// Period the report belonged to, when it was derived before the failure
    pub fn period(&self) -> Option<Period> {
        match self {
            FileError::Period(_) => None,
            FileError::UnknownAsset { period, .. } | FileError::Grid { period, .. } => Some(*period),
            FileError::Conflict(conflict) => Some(conflict.period),
        }
    }
}

/// Failures that abort the run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid sheet layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("No candidate workbooks found")]
    NoCandidateFiles,

    #[error("No data was extracted from any file")]
    NothingExtracted,

    #[error("Failed to write artifacts: {0}")]
    Output(#[from] OutputError),
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// Summary of a run, printed as JSON in dry-run mode
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: NaiveDateTime,
    pub files_seen: usize,
    pub files_processed: usize,
    /// Files whose period came from the current-month fallback
    pub period_fallbacks: Vec<String>,
    pub failures: Vec<FileFailure>,
    pub dataset: Dataset,
    pub artifacts: Option<Artifacts>,
}

/// Runs fetch, extraction, merge and output for one batch of reports
pub struct PipelineService<F> {
    fetcher: F,
    loader: GridLoader,
    deriver: PeriodKeyDeriver,
    merge_policy: MergePolicy,
    target_period: Option<Period>,
    composer: OutputComposer,
}

impl<F: Fetcher> PipelineService<F> {
    pub fn new(config: &Config, fetcher: F) -> Self {
        Self {
            fetcher,
            loader: GridLoader::new(config.sheet_name.clone()),
            deriver: PeriodKeyDeriver::new(config.period_fallback),
            merge_policy: config.merge_policy,
            target_period: config.target_period,
            composer: OutputComposer::new(config.output_dir.clone()),
        }
    }

    /// Extract every report and write the artifacts
    pub fn run(&self, now: NaiveDateTime) -> Result<RunReport, PipelineError> {
        let mut report = self.extract(now)?;
        report.artifacts = Some(self.composer.write(&report.dataset, now)?);
        info!("Adaptive extraction process completed successfully");
        Ok(report)
    }

    /// Extract every report into a dataset without writing anything
    ///
    /// Report-level failures are logged and recorded in the report; only a
    /// failed fetch, an empty input or an empty dataset stop the run.
    pub fn extract(&self, now: NaiveDateTime) -> Result<RunReport, PipelineError> {
        let start_time = Instant::now();
        let today = now.date();

        for asset in AssetType::ALL {
            SheetLayout::for_asset(asset).validate()?;
        }

        let files = self.fetcher.fetch(self.target_period)?;
        if files.is_empty() {
            error!("No Excel files found for the pipeline");
            return Err(PipelineError::NoCandidateFiles);
        }

        let mut accumulator = DatasetAccumulator::new(self.merge_policy);
        let mut files_processed = 0;
        let mut period_fallbacks = Vec::new();
        let mut failures = Vec::new();

        for path in &files {
            let file = file_label(path);

            let outcome = self
                .process_file(path, today)
                .and_then(|(derived, result)| {
                    accumulator.merge(derived.period, result)?;
                    Ok(derived)
                });

            match outcome {
                Ok(derived) => {
                    files_processed += 1;
                    if derived.source == PeriodSource::Fallback {
                        period_fallbacks.push(file.clone());
                    }
                }
                Err(e) => {
                    error!("Error processing {}: {}", file, e);
                    // Keep the period on the books even though the report yielded nothing
                    if let Some(period) = e.period() {
                        accumulator.ensure_period(period);
                    }
                    failures.push(FileFailure {
                        file,
                        error: e.to_string(),
                    });
                }
            }
        }

        let dataset = accumulator.finish();
        if dataset.is_empty() {
            error!("Data extraction failed. No data was extracted from any file.");
            return Err(PipelineError::NothingExtracted);
        }

        info!(
            "Processed {}/{} file(s) into {} period(s) in {:.1}s",
            files_processed,
            files.len(),
            dataset.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(RunReport {
            generated_at: now,
            files_seen: files.len(),
            files_processed,
            period_fallbacks,
            failures,
            dataset,
            artifacts: None,
        })
    }

    /// Derive the period, classify the asset, load the sheet and extract it
    #[instrument(skip(self, path, today), fields(file = %file_label(path)))]
    pub fn process_file(
        &self,
        path: &Path,
        today: NaiveDate,
    ) -> Result<(DerivedPeriod, ExtractionResult), FileError> {
        let file = file_label(path);
        info!("Processing: {}", file);

        let derived = self.deriver.derive(&file, today)?;
        let period = derived.period;

        let asset = AssetType::from_file_name(&file).ok_or_else(|| FileError::UnknownAsset {
            file: file.clone(),
            period,
        })?;

        let grid = self
            .loader
            .load(path)
            .map_err(|source| FileError::Grid { period, source })?;

        let result = extract_sheet(&grid, asset, SheetLayout::for_asset(asset));
        Ok((derived, result))
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
