// Adaptive extraction of indicator values from one report sheet
//
// Sales and purchases sit at fixed coordinates; balances drift by up to two rows
// between report revisions and are found with a bounded search. The two paths
// produce disjoint code sets (see SheetLayout::validate).

pub mod balance_resolver;
pub mod fixed_fields;
pub mod period;

pub use balance_resolver::{CategoryBalanceResolver, ResolvedBalance};
pub use fixed_fields::FixedFieldExtractor;
pub use period::{
    parse_period_token, DerivedPeriod, Period, PeriodError, PeriodFallback, PeriodKeyDeriver,
    PeriodSource,
};

use tracing::info;

use crate::catalog::{AssetType, CategoryKey, SheetLayout};
use crate::dataset::ExtractionResult;
use crate::importers::Grid;

/// Run both extraction paths over a sheet and combine them
pub fn extract_sheet(grid: &Grid, asset: AssetType, layout: &SheetLayout) -> ExtractionResult {
    let mut result = FixedFieldExtractor::new(layout).extract(grid, asset);
    let fixed_expected = layout.fixed_fields(asset).count();

    for balance in CategoryBalanceResolver::new(layout).resolve_all(grid, asset) {
        let previous = result.insert(balance.code, balance.value);
        debug_assert!(previous.is_none(), "{} produced by both paths", balance.code);
    }

    info!(
        "Extracted {}/{} data points for {}",
        result.len(),
        fixed_expected + CategoryKey::ALL.len(),
        asset
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{IndicatorCode, MetricClass, STANDARD_LAYOUT};
    use crate::importers::Cell;

    #[test]
    fn test_full_sheet_yields_42_codes() {
        let mut rows = vec![vec![Cell::Empty; 7]; 60];
        for row in rows.iter_mut() {
            row[4] = Cell::Int(11);
            row[6] = Cell::Int(22);
        }
        let result = extract_sheet(&Grid::from_rows(rows), AssetType::Etf, &STANDARD_LAYOUT);

        assert_eq!(result.len(), 42);
        let balance = IndicatorCode::new(AssetType::Etf, MetricClass::Balance, CategoryKey::Banks);
        let sales = IndicatorCode::new(AssetType::Etf, MetricClass::Sales, CategoryKey::Banks);
        assert_eq!(result.get(&balance), Some("22"));
        assert_eq!(result.get(&sales), Some("11"));
        assert!(result.codes().all(|code| code.asset == AssetType::Etf));
    }

    #[test]
    fn test_blank_sheet_yields_nothing() {
        let result = extract_sheet(&Grid::default(), AssetType::Reit, &STANDARD_LAYOUT);
        assert!(result.is_empty());
    }
}
