use std::env;
use std::path::PathBuf;

use crate::dataset::MergePolicy;
use crate::extract::{Period, PeriodError, PeriodFallback};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid JTMD_TARGET_PERIOD: {0}")]
    TargetPeriod(#[from] PeriodError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub sheet_name: String,
    pub merge_policy: MergePolicy,
    pub period_fallback: PeriodFallback,
    pub target_period: Option<Period>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("downloads"),
            output_dir: PathBuf::from("output"),
            sheet_name: "Value".to_string(),
            merge_policy: MergePolicy::default(),
            period_fallback: PeriodFallback::default(),
            target_period: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        Ok(Config {
            input_dir: env::var("JTMD_INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.input_dir),
            output_dir: env::var("JTMD_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            sheet_name: env::var("JTMD_SHEET_NAME").unwrap_or(defaults.sheet_name),
            merge_policy: match env::var("JTMD_MERGE_POLICY") {
                Ok(value) => value.parse()?,
                Err(_) => defaults.merge_policy,
            },
            period_fallback: match env::var("JTMD_PERIOD_FALLBACK") {
                Ok(value) => value.parse()?,
                Err(_) => defaults.period_fallback,
            },
            target_period: match env::var("JTMD_TARGET_PERIOD") {
                Ok(value) if !value.trim().is_empty() => Some(value.parse()?),
                _ => None,
            },
        })
    }
}
