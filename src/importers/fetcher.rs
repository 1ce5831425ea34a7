use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::extract::period::{parse_period_token, Period};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Input directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("Failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Supplies report workbooks for a run
///
/// Implementations guarantee that every returned path exists when `fetch`
/// succeeds. `period` narrows the result to one reporting month; None means
/// every report the source has.
pub trait Fetcher {
    fn fetch(&self, period: Option<Period>) -> Result<Vec<PathBuf>, FetchError>;
}

/// Reads reports already present in a local directory
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    dir: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Fetcher for DirectoryFetcher {
    fn fetch(&self, period: Option<Period>) -> Result<Vec<PathBuf>, FetchError> {
        if !self.dir.is_dir() {
            return Err(FetchError::MissingDirectory(self.dir.clone()));
        }

        let io_err = |source| FetchError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !is_workbook_name(name) {
                debug!("Ignoring non-workbook file {}", name);
                continue;
            }
            if let Some(target) = period {
                if parse_period_token(name) != Some(target) {
                    debug!("Ignoring {} (not a {} report)", name, target);
                    continue;
                }
            }
            files.push(path);
        }

        // Stable order keeps last-write-wins merges reproducible across machines
        files.sort();
        info!(
            "Found {} candidate workbook(s) in {}",
            files.len(),
            self.dir.display()
        );
        Ok(files)
    }
}

/// `.xls`, `.xlsx`, `.xlsm` and `.xlsb`, minus Office lock files (`~$name.xlsx`)
pub fn is_workbook_name(name: &str) -> bool {
    if name.starts_with("~$") {
        return false;
    }
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase().starts_with("xls"))
        .unwrap_or(false)
}
