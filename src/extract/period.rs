//! Reporting period keys and their derivation from report file names
//!
//! JPX names monthly reports with an `m<YY><MM>` token (`etf_m2403.xls` is the
//! March 2024 ETF report).
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::warn;

use crate::config::ConfigError;

static PERIOD_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"m(\d{2})(\d{2})").expect("period token pattern is valid"));

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Invalid period {0}: expected YYYY-MM")]
    InvalidFormat(String),

    #[error("Month {0} out of range")]
    InvalidMonth(u32),

    #[error("No m<YY><MM> period token in file name: {0}")]
    Unparseable(String),
}

/// One reporting month, ordered chronologically and displayed as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PeriodError::InvalidFormat(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Period::new(year, month)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Find the first `m<YY><MM>` token with a real month, case-insensitively
pub fn parse_period_token(file_name: &str) -> Option<Period> {
    let lower = file_name.to_lowercase();
    PERIOD_TOKEN.captures_iter(&lower).find_map(|cap| {
        let year_suffix = cap[1].parse::<i32>().ok()?;
        let month = cap[2].parse::<u32>().ok()?;
        Period::new(2000 + year_suffix, month).ok()
    })
}

/// What to do with a file name that carries no period token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodFallback {
    /// Substitute the current month and warn
    #[default]
    CurrentMonth,
    /// Skip the file
    Reject,
}

impl FromStr for PeriodFallback {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current-month" | "current_month" | "now" => Ok(PeriodFallback::CurrentMonth),
            "reject" | "skip" => Ok(PeriodFallback::Reject),
            _ => Err(ConfigError::InvalidValue {
                key: "period fallback",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PeriodFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodFallback::CurrentMonth => f.write_str("current-month"),
            PeriodFallback::Reject => f.write_str("reject"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodSource {
    FileName,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedPeriod {
    pub period: Period,
    pub source: PeriodSource,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodKeyDeriver {
    fallback: PeriodFallback,
}

impl PeriodKeyDeriver {
    pub fn new(fallback: PeriodFallback) -> Self {
        Self { fallback }
    }

    /// Period for a report file; `today` backs the current-month fallback
    pub fn derive(&self, file_name: &str, today: NaiveDate) -> Result<DerivedPeriod, PeriodError> {
        if let Some(period) = parse_period_token(file_name) {
            return Ok(DerivedPeriod {
                period,
                source: PeriodSource::FileName,
            });
        }

        match self.fallback {
            PeriodFallback::CurrentMonth => {
                let period = Period::from_date(today);
                warn!(
                    "Could not extract period from '{}'. Using current month {} as fallback.",
                    file_name, period
                );
                Ok(DerivedPeriod {
                    period,
                    source: PeriodSource::Fallback,
                })
            }
            PeriodFallback::Reject => Err(PeriodError::Unparseable(file_name.to_string())),
        }
    }
}
