// Output artifacts for a run
//
// - data_table: codes x periods CSV with two header rows
// - metadata_table: one descriptive row per catalog code
// - archive: zip bundle of the two CSVs
//
// File names carry only the generation date, so a second run on the same day
// replaces the first run's files.

pub mod archive;
pub mod data_table;
pub mod metadata_table;

pub use data_table::{parse_data_table, render_data_table};
pub use metadata_table::render_metadata_table;

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::catalog::DATASET_NAME;
use crate::dataset::Dataset;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Malformed data table: {0}")]
    Malformed(String),
}

/// Deterministic artifact names for one generation date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub data: String,
    pub metadata: String,
    pub archive: String,
}

impl ArtifactNames {
    pub fn for_timestamp(generated_at: NaiveDateTime) -> Self {
        let stamp = generated_at.format("%Y%m%d");
        Self {
            data: format!("{DATASET_NAME}_DATA_{stamp}.csv"),
            metadata: format!("{DATASET_NAME}_META_{stamp}.csv"),
            archive: format!("{DATASET_NAME}_{stamp}.zip"),
        }
    }
}

/// Paths of the files written by a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifacts {
    pub data_file: PathBuf,
    pub metadata_file: PathBuf,
    pub archive: PathBuf,
}

pub struct OutputComposer {
    output_dir: PathBuf,
}

impl OutputComposer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write the data table, metadata table and archive into the output directory
    pub fn write(
        &self,
        dataset: &Dataset,
        generated_at: NaiveDateTime,
    ) -> Result<Artifacts, OutputError> {
        fs::create_dir_all(&self.output_dir)?;
        let names = ArtifactNames::for_timestamp(generated_at);

        let data_file = self.output_dir.join(&names.data);
        write_atomically(&data_file, render_data_table(dataset)?.as_bytes())?;
        info!("Created data CSV: {}", data_file.display());

        let metadata_file = self.output_dir.join(&names.metadata);
        write_atomically(&metadata_file, render_metadata_table(generated_at)?.as_bytes())?;
        info!("Created metadata CSV: {}", metadata_file.display());

        let archive = self.output_dir.join(&names.archive);
        archive::write_archive(&archive, &[&data_file, &metadata_file])?;
        info!("Created ZIP archive: {}", archive.display());

        Ok(Artifacts {
            data_file,
            metadata_file,
            archive,
        })
    }
}

/// Replace `path` with `contents` via a temp file in the same directory
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), OutputError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
    temp_file.write_all(contents)?;
    temp_file.flush()?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
