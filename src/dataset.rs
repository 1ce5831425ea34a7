use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::catalog::IndicatorCode;
use crate::config::ConfigError;
use crate::extract::Period;

/// Indicator values pulled from one report
///
/// A code missing from the map was not found in the sheet. Values are never
/// empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtractionResult {
    values: BTreeMap<IndicatorCode, String>,
}

impl ExtractionResult {
    pub fn insert(&mut self, code: IndicatorCode, value: String) -> Option<String> {
        self.values.insert(code, value)
    }

    pub fn get(&self, code: &IndicatorCode) -> Option<&str> {
        self.values.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &IndicatorCode) -> bool {
        self.values.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &IndicatorCode> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IndicatorCode, &str)> {
        self.values.iter().map(|(code, value)| (code, value.as_str()))
    }
}

impl FromIterator<(IndicatorCode, String)> for ExtractionResult {
    fn from_iter<I: IntoIterator<Item = (IndicatorCode, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// All extracted values for a run, keyed by period in ascending order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    periods: BTreeMap<Period, ExtractionResult>,
}

impl Dataset {
    pub fn get(&self, period: &Period) -> Option<&ExtractionResult> {
        self.periods.get(period)
    }

    pub fn periods(&self) -> impl Iterator<Item = &Period> {
        self.periods.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Period, &ExtractionResult)> {
        self.periods.iter()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

impl FromIterator<(Period, ExtractionResult)> for Dataset {
    fn from_iter<I: IntoIterator<Item = (Period, ExtractionResult)>>(iter: I) -> Self {
        Self {
            periods: iter.into_iter().collect(),
        }
    }
}

/// How a report merges into a period that already has values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Incoming values replace existing ones
    #[default]
    LastWriteWins,
    /// Existing values are kept
    FirstWriteWins,
    /// A differing value for the same code rejects the whole report
    Reject,
}

impl FromStr for MergePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "last-write-wins" | "last_write_wins" | "last" => Ok(MergePolicy::LastWriteWins),
            "first-write-wins" | "first_write_wins" | "first" => Ok(MergePolicy::FirstWriteWins),
            "reject" | "strict" => Ok(MergePolicy::Reject),
            _ => Err(ConfigError::InvalidValue {
                key: "merge policy",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::LastWriteWins => f.write_str("last-write-wins"),
            MergePolicy::FirstWriteWins => f.write_str("first-write-wins"),
            MergePolicy::Reject => f.write_str("reject"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Conflicting values for {code} in {period}: existing {existing}, incoming {incoming}")]
pub struct MergeConflict {
    pub period: Period,
    pub code: IndicatorCode,
    pub existing: String,
    pub incoming: String,
}

/// Outcome of one merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub new_period: bool,
    pub inserted: usize,
    pub overwritten: usize,
    pub kept: usize,
}

/// Owns the dataset while reports are being merged into it
#[derive(Debug, Default)]
pub struct DatasetAccumulator {
    dataset: Dataset,
    policy: MergePolicy,
}

impl DatasetAccumulator {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            dataset: Dataset::default(),
            policy,
        }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Merge one report's values into `period`
    ///
    /// Under `MergePolicy::Reject` the dataset is left untouched when any code
    /// already holds a different value. Identical values never conflict, so
    /// reprocessing a report is always accepted.
    pub fn merge(
        &mut self,
        period: Period,
        incoming: ExtractionResult,
    ) -> Result<MergeSummary, MergeConflict> {
        let existing = match self.dataset.periods.entry(period) {
            Entry::Vacant(slot) => {
                let summary = MergeSummary {
                    new_period: true,
                    inserted: incoming.len(),
                    ..MergeSummary::default()
                };
                slot.insert(incoming);
                debug!("Added period {} with {} values", period, summary.inserted);
                return Ok(summary);
            }
            Entry::Occupied(slot) => slot.into_mut(),
        };

        if self.policy == MergePolicy::Reject {
            for (code, value) in incoming.iter() {
                if let Some(current) = existing.get(code) {
                    if current != value {
                        return Err(MergeConflict {
                            period,
                            code: *code,
                            existing: current.to_string(),
                            incoming: value.to_string(),
                        });
                    }
                }
            }
        }

        let mut summary = MergeSummary::default();
        for (code, value) in incoming.values {
            match existing.values.entry(code) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                    summary.inserted += 1;
                }
                Entry::Occupied(mut slot) => {
                    if slot.get() == &value {
                        summary.kept += 1;
                    } else if self.policy == MergePolicy::FirstWriteWins {
                        debug!("{} in {}: keeping {}, ignoring {}", code, period, slot.get(), value);
                        summary.kept += 1;
                    } else {
                        warn!("{} in {}: replacing {} with {}", code, period, slot.get(), value);
                        slot.insert(value);
                        summary.overwritten += 1;
                    }
                }
            }
        }

        info!(
            "Merged into {}: {} new, {} overwritten, {} kept",
            period, summary.inserted, summary.overwritten, summary.kept
        );
        Ok(summary)
    }

    /// Give `period` a row even when none of its reports yielded values
    pub fn ensure_period(&mut self, period: Period) {
        self.dataset.periods.entry(period).or_default();
    }

    pub fn finish(self) -> Dataset {
        self.dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AssetType, CategoryKey, MetricClass};

    fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn code(asset: AssetType, metric: MetricClass) -> IndicatorCode {
        IndicatorCode::new(asset, metric, CategoryKey::Individuals)
    }

    fn result(pairs: &[(IndicatorCode, &str)]) -> ExtractionResult {
        pairs.iter().map(|(c, v)| (*c, v.to_string())).collect()
    }

    #[test]
    fn test_new_period_inserted_whole() {
        let mut acc = DatasetAccumulator::default();
        let etf = code(AssetType::Etf, MetricClass::Sales);
        let summary = acc.merge(period("2024-03"), result(&[(etf, "10")])).unwrap();

        assert!(summary.new_period);
        assert_eq!(summary.inserted, 1);
        assert_eq!(acc.dataset().get(&period("2024-03")).unwrap().get(&etf), Some("10"));
    }

    #[test]
    fn test_disjoint_reports_union() {
        let mut acc = DatasetAccumulator::default();
        let etf = code(AssetType::Etf, MetricClass::Balance);
        let reit = code(AssetType::Reit, MetricClass::Balance);
        acc.merge(period("2024-03"), result(&[(etf, "1")])).unwrap();
        let summary = acc.merge(period("2024-03"), result(&[(reit, "2")])).unwrap();

        assert!(!summary.new_period);
        let dataset = acc.finish();
        assert_eq!(dataset.len(), 1);
        let merged = dataset.get(&period("2024-03")).unwrap();
        assert_eq!(merged.get(&etf), Some("1"));
        assert_eq!(merged.get(&reit), Some("2"));
    }

    #[test]
    fn test_last_write_wins() {
        let mut acc = DatasetAccumulator::new(MergePolicy::LastWriteWins);
        let etf = code(AssetType::Etf, MetricClass::Sales);
        acc.merge(period("2024-03"), result(&[(etf, "old")])).unwrap();
        let summary = acc.merge(period("2024-03"), result(&[(etf, "new")])).unwrap();

        assert_eq!(summary.overwritten, 1);
        assert_eq!(acc.dataset().get(&period("2024-03")).unwrap().get(&etf), Some("new"));
    }

    #[test]
    fn test_first_write_wins() {
        let mut acc = DatasetAccumulator::new(MergePolicy::FirstWriteWins);
        let etf = code(AssetType::Etf, MetricClass::Sales);
        acc.merge(period("2024-03"), result(&[(etf, "old")])).unwrap();
        let summary = acc.merge(period("2024-03"), result(&[(etf, "new")])).unwrap();

        assert_eq!(summary.kept, 1);
        assert_eq!(acc.dataset().get(&period("2024-03")).unwrap().get(&etf), Some("old"));
    }

    #[test]
    fn test_reject_leaves_dataset_untouched() {
        let mut acc = DatasetAccumulator::new(MergePolicy::Reject);
        let etf = code(AssetType::Etf, MetricClass::Sales);
        let reit = code(AssetType::Reit, MetricClass::Sales);
        acc.merge(period("2024-03"), result(&[(etf, "old")])).unwrap();

        let conflict = acc
            .merge(period("2024-03"), result(&[(reit, "5"), (etf, "new")]))
            .unwrap_err();
        assert_eq!(conflict.code, etf);
        assert_eq!(conflict.existing, "old");
        assert_eq!(conflict.incoming, "new");

        let stored = acc.dataset().get(&period("2024-03")).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored.contains(&reit));
    }

    #[test]
    fn test_reject_accepts_identical_values() {
        let mut acc = DatasetAccumulator::new(MergePolicy::Reject);
        let etf = code(AssetType::Etf, MetricClass::Sales);
        acc.merge(period("2024-03"), result(&[(etf, "7")])).unwrap();
        let summary = acc.merge(period("2024-03"), result(&[(etf, "7")])).unwrap();
        assert_eq!(summary.kept, 1);
    }

    #[test]
    fn test_reprocessing_is_idempotent() {
        let etf = code(AssetType::Etf, MetricClass::Purchases);
        let report = result(&[(etf, "42")]);

        let mut once = DatasetAccumulator::default();
        once.merge(period("2024-03"), report.clone()).unwrap();

        let mut twice = DatasetAccumulator::default();
        twice.merge(period("2024-03"), report.clone()).unwrap();
        twice.merge(period("2024-03"), report).unwrap();

        assert_eq!(once.finish(), twice.finish());
    }

    #[test]
    fn test_periods_iterate_ascending() {
        let mut acc = DatasetAccumulator::default();
        for p in ["2024-03", "2023-12", "2024-01"] {
            acc.merge(period(p), ExtractionResult::default()).unwrap();
        }
        let order: Vec<String> = acc.dataset().periods().map(|p| p.to_string()).collect();
        assert_eq!(order, vec!["2023-12", "2024-01", "2024-03"]);
    }

    #[test]
    fn test_ensure_period_keeps_existing_values() {
        let mut acc = DatasetAccumulator::default();
        let etf = code(AssetType::Etf, MetricClass::Sales);
        acc.merge(period("2024-03"), result(&[(etf, "1")])).unwrap();
        acc.ensure_period(period("2024-03"));
        acc.ensure_period(period("2024-04"));

        let dataset = acc.finish();
        assert_eq!(dataset.get(&period("2024-03")).unwrap().len(), 1);
        assert!(dataset.get(&period("2024-04")).unwrap().is_empty());
    }

    #[test]
    fn test_merge_policy_from_str() {
        assert_eq!("reject".parse::<MergePolicy>().unwrap(), MergePolicy::Reject);
        assert_eq!(
            "LAST-WRITE-WINS".parse::<MergePolicy>().unwrap(),
            MergePolicy::LastWriteWins
        );
        assert!("random".parse::<MergePolicy>().is_err());
    }

    #[test]
    fn test_dataset_serializes_with_string_keys() {
        let etf = IndicatorCode::new(AssetType::Etf, MetricClass::Balance, CategoryKey::Proprietary);
        let dataset: Dataset = [(period("2024-03"), result(&[(etf, "12")]))]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&dataset).unwrap();
        assert_eq!(json, r#"{"2024-03":{"JTMD.ETF.BAL.PROP.M":"12"}}"#);
    }
}
