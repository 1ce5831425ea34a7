//! JTMD indicator codes
//!
//! Codes have the shape `JTMD.<ASSET>.<METRIC>.<CATEGORY>.M`, for example
//! `JTMD.ETF.BAL.PROP.M`. The enums below are declared in catalog order, so the
//! derived `Ord` on [`IndicatorCode`] sorts codes exactly as the output tables
//! list them.
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Dataset prefix used in codes and artifact names
pub const DATASET_NAME: &str = "JTMD";

/// Frequency suffix; every series is monthly
const FREQUENCY_TOKEN: &str = "M";

/// Number of codes in the catalog (2 assets x 3 metrics x 14 categories)
pub const CATALOG_SIZE: usize = AssetType::ALL.len() * MetricClass::ALL.len() * CategoryKey::ALL.len();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AssetType {
    #[serde(rename = "ETF")]
    Etf,
    #[serde(rename = "REIT")]
    Reit,
}

impl AssetType {
    pub const ALL: [AssetType; 2] = [AssetType::Etf, AssetType::Reit];

    pub fn token(self) -> &'static str {
        match self {
            AssetType::Etf => "ETF",
            AssetType::Reit => "REIT",
        }
    }

    /// Classify a report by its file name (`etf_m2403.xls`, `reit_m2403.xls`)
    ///
    /// Returns None when neither marker is present; the caller decides whether
    /// that skips the file.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_lowercase();
        if lower.contains("etf") {
            Some(AssetType::Etf)
        } else if lower.contains("reit") {
            Some(AssetType::Reit)
        } else {
            None
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Balance rows drift between revisions; sales and purchases stay put
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricClass {
    Balance,
    Sales,
    Purchases,
}

impl MetricClass {
    pub const ALL: [MetricClass; 3] = [
        MetricClass::Balance,
        MetricClass::Sales,
        MetricClass::Purchases,
    ];

    pub fn token(self) -> &'static str {
        match self {
            MetricClass::Balance => "BAL",
            MetricClass::Sales => "SAL",
            MetricClass::Purchases => "PURCH",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetricClass::Balance => "Balance",
            MetricClass::Sales => "Sales",
            MetricClass::Purchases => "Purchases",
        }
    }

    /// True for metrics read from a fixed coordinate
    pub fn is_fixed(self) -> bool {
        !matches!(self, MetricClass::Balance)
    }
}

/// Trader categories shared by the ETF and REIT reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoryKey {
    Proprietary,
    Brokerage,
    Total,
    Institutions,
    Individuals,
    Foreigners,
    SecuritiesCos,
    InvestmentTrusts,
    BusinessCos,
    OtherCos,
    FinancialInstitutions,
    Insurance,
    Banks,
    OtherFinancials,
}

impl CategoryKey {
    pub const ALL: [CategoryKey; 14] = [
        CategoryKey::Proprietary,
        CategoryKey::Brokerage,
        CategoryKey::Total,
        CategoryKey::Institutions,
        CategoryKey::Individuals,
        CategoryKey::Foreigners,
        CategoryKey::SecuritiesCos,
        CategoryKey::InvestmentTrusts,
        CategoryKey::BusinessCos,
        CategoryKey::OtherCos,
        CategoryKey::FinancialInstitutions,
        CategoryKey::Insurance,
        CategoryKey::Banks,
        CategoryKey::OtherFinancials,
    ];

    pub fn token(self) -> &'static str {
        match self {
            CategoryKey::Proprietary => "PROP",
            CategoryKey::Brokerage => "BROKER",
            CategoryKey::Total => "TOT",
            CategoryKey::Institutions => "INST",
            CategoryKey::Individuals => "INDIV",
            CategoryKey::Foreigners => "FOR",
            CategoryKey::SecuritiesCos => "SECCOS",
            CategoryKey::InvestmentTrusts => "INVTRUST",
            CategoryKey::BusinessCos => "BUSCORP",
            CategoryKey::OtherCos => "OTHINST",
            CategoryKey::FinancialInstitutions => "INSTFIN",
            CategoryKey::Insurance => "INS",
            CategoryKey::Banks => "BK",
            CategoryKey::OtherFinancials => "OTHERFIN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryKey::Proprietary => "Proprietary",
            CategoryKey::Brokerage => "Brokerage",
            CategoryKey::Total => "Total",
            CategoryKey::Institutions => "Institutions",
            CategoryKey::Individuals => "Individuals",
            CategoryKey::Foreigners => "Foreigners",
            CategoryKey::SecuritiesCos => "Securities Cos.",
            CategoryKey::InvestmentTrusts => "Investment Trusts",
            CategoryKey::BusinessCos => "Business Cos.",
            CategoryKey::OtherCos => "Other Cos.",
            CategoryKey::FinancialInstitutions => "Financial Institutions",
            CategoryKey::Insurance => "Life/Non-Life Insurance",
            CategoryKey::Banks => "Banks",
            CategoryKey::OtherFinancials => "Other Financials",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.token() == token)
    }
}

/// A code from the fixed catalog
///
/// Only catalog members can be built, either from their parts or by parsing the
/// dotted string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndicatorCode {
    pub asset: AssetType,
    pub metric: MetricClass,
    pub category: CategoryKey,
}

impl IndicatorCode {
    pub const fn new(asset: AssetType, metric: MetricClass, category: CategoryKey) -> Self {
        Self {
            asset,
            metric,
            category,
        }
    }

    /// Human-readable description, e.g. "ETF, Balance, Proprietary"
    pub fn description(&self) -> String {
        format!(
            "{}, {}, {}",
            self.asset.token(),
            self.metric.label(),
            self.category.label()
        )
    }
}

impl fmt::Display for IndicatorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{DATASET_NAME}.{}.{}.{}.{FREQUENCY_TOKEN}",
            self.asset.token(),
            self.metric.token(),
            self.category.token()
        )
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown indicator code: {0}")]
pub struct UnknownCode(pub String);

impl FromStr for IndicatorCode {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownCode(s.to_string());
        let parts: Vec<&str> = s.trim().split('.').collect();
        let [dataset, asset, metric, category, freq] = parts.as_slice() else {
            return Err(unknown());
        };
        if *dataset != DATASET_NAME || *freq != FREQUENCY_TOKEN {
            return Err(unknown());
        }

        let asset = AssetType::ALL
            .into_iter()
            .find(|a| a.token() == *asset)
            .ok_or_else(unknown)?;
        let metric = MetricClass::ALL
            .into_iter()
            .find(|m| m.token() == *metric)
            .ok_or_else(unknown)?;
        let category = CategoryKey::from_token(category).ok_or_else(unknown)?;

        Ok(IndicatorCode::new(asset, metric, category))
    }
}

impl Serialize for IndicatorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// All catalog codes in output order: ETF before REIT, then BAL, SAL, PURCH
pub fn catalog() -> impl Iterator<Item = IndicatorCode> {
    AssetType::ALL.into_iter().flat_map(|asset| {
        MetricClass::ALL.into_iter().flat_map(move |metric| {
            CategoryKey::ALL
                .into_iter()
                .map(move |category| IndicatorCode::new(asset, metric, category))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_84_unique_codes() {
        let codes: Vec<String> = catalog().map(|c| c.to_string()).collect();
        assert_eq!(codes.len(), CATALOG_SIZE);
        assert_eq!(CATALOG_SIZE, 84);

        let unique: HashSet<&String> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_catalog_order_matches_derived_ord() {
        let codes: Vec<IndicatorCode> = catalog().collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn test_catalog_boundaries() {
        let codes: Vec<String> = catalog().map(|c| c.to_string()).collect();
        assert_eq!(codes[0], "JTMD.ETF.BAL.PROP.M");
        assert_eq!(codes[14], "JTMD.ETF.SAL.PROP.M");
        assert_eq!(codes[41], "JTMD.ETF.PURCH.OTHERFIN.M");
        assert_eq!(codes[42], "JTMD.REIT.BAL.PROP.M");
        assert_eq!(codes[83], "JTMD.REIT.PURCH.OTHERFIN.M");
    }

    #[test]
    fn test_code_parses_back() {
        for code in catalog() {
            let parsed: IndicatorCode = code.to_string().parse().unwrap();
            assert_eq!(parsed, code);
        }
    }

    #[test]
    fn test_unknown_codes_rejected() {
        assert!("JTMD.ETF.BAL.NOPE.M".parse::<IndicatorCode>().is_err());
        assert!("JTMD.BOND.BAL.PROP.M".parse::<IndicatorCode>().is_err());
        assert!("XYZ.ETF.BAL.PROP.M".parse::<IndicatorCode>().is_err());
        assert!("JTMD.ETF.BAL.PROP.Q".parse::<IndicatorCode>().is_err());
        assert!("JTMD.ETF.BAL.PROP".parse::<IndicatorCode>().is_err());
        assert!("".parse::<IndicatorCode>().is_err());
    }

    #[test]
    fn test_descriptions() {
        let code = IndicatorCode::new(AssetType::Reit, MetricClass::Purchases, CategoryKey::Insurance);
        assert_eq!(code.description(), "REIT, Purchases, Life/Non-Life Insurance");

        let code = IndicatorCode::new(AssetType::Etf, MetricClass::Balance, CategoryKey::SecuritiesCos);
        assert_eq!(code.description(), "ETF, Balance, Securities Cos.");
    }

    #[test]
    fn test_asset_from_file_name() {
        assert_eq!(AssetType::from_file_name("etf_m2403.xls"), Some(AssetType::Etf));
        assert_eq!(AssetType::from_file_name("REIT_m2403.xlsx"), Some(AssetType::Reit));
        assert_eq!(AssetType::from_file_name("stock_m2403.xls"), None);
    }

    #[test]
    fn test_metric_strategy() {
        assert!(!MetricClass::Balance.is_fixed());
        assert!(MetricClass::Sales.is_fixed());
        assert!(MetricClass::Purchases.is_fixed());
    }
}
