//! Sheet layout tables for the monthly "Value" sheet
//!
//! Row and column indices are 0-based and absolute. Each category occupies a
//! block of rows: sales on the first row, purchases on the next, both in column
//! E (index 4). The balance figure sits in column G (index 6) somewhere in the
//! first three rows of the block; revisions occasionally insert a subtotal line
//! that pushes it down by one or two rows.
use std::collections::{HashMap, HashSet};

use super::codes::{AssetType, CategoryKey, IndicatorCode, MetricClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub row: usize,
    pub col: usize,
}

impl Coordinate {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Row positions for one trader category
#[derive(Debug, Clone, Copy)]
pub struct CategoryRows {
    pub category: CategoryKey,
    pub balance_base_row: usize,
    pub sales_row: usize,
    pub purchases_row: usize,
}

const fn rows(category: CategoryKey, base: usize) -> CategoryRows {
    CategoryRows {
        category,
        balance_base_row: base,
        sales_row: base,
        purchases_row: base + 1,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SheetLayout {
    /// Column holding sales and purchases
    pub trade_column: usize,
    /// Column holding balances
    pub balance_column: usize,
    /// Offsets probed below each balance base row, in order
    pub balance_offsets: &'static [usize],
    pub categories: &'static [CategoryRows],
}

pub const STANDARD_LAYOUT: SheetLayout = SheetLayout {
    trade_column: 4,
    balance_column: 6,
    balance_offsets: &[0, 1, 2],
    categories: &[
        rows(CategoryKey::Proprietary, 13),
        rows(CategoryKey::Brokerage, 16),
        rows(CategoryKey::Total, 19),
        rows(CategoryKey::Institutions, 24),
        rows(CategoryKey::Individuals, 27),
        rows(CategoryKey::Foreigners, 30),
        rows(CategoryKey::SecuritiesCos, 33),
        rows(CategoryKey::InvestmentTrusts, 38),
        rows(CategoryKey::BusinessCos, 41),
        rows(CategoryKey::OtherCos, 44),
        rows(CategoryKey::FinancialInstitutions, 47),
        rows(CategoryKey::Insurance, 52),
        rows(CategoryKey::Banks, 55),
        rows(CategoryKey::OtherFinancials, 58),
    ],
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Category {0:?} appears more than once")]
    DuplicateCategory(CategoryKey),

    #[error("Category {0:?} has no rows in the layout")]
    MissingCategory(CategoryKey),

    #[error("Fields {first} and {second} share row {row}, col {col}")]
    DuplicateCoordinate {
        first: String,
        second: String,
        row: usize,
        col: usize,
    },

    #[error("Balance windows for {first:?} and {second:?} overlap at row {row}")]
    OverlappingWindows {
        first: CategoryKey,
        second: CategoryKey,
        row: usize,
    },

    #[error("Balance search has no offsets")]
    EmptyWindow,
}

impl SheetLayout {
    /// Layout used for an asset's report
    ///
    /// ETF and REIT reports currently share one layout.
    pub fn for_asset(asset: AssetType) -> &'static SheetLayout {
        match asset {
            AssetType::Etf | AssetType::Reit => &STANDARD_LAYOUT,
        }
    }

    /// Sales and purchases fields with their fixed coordinates
    pub fn fixed_fields(
        &self,
        asset: AssetType,
    ) -> impl Iterator<Item = (IndicatorCode, Coordinate)> + '_ {
        let col = self.trade_column;
        self.categories.iter().flat_map(move |rows| {
            MetricClass::ALL
                .into_iter()
                .filter(|metric| metric.is_fixed())
                .map(move |metric| {
                    let row = match metric {
                        MetricClass::Purchases => rows.purchases_row,
                        _ => rows.sales_row,
                    };
                    (
                        IndicatorCode::new(asset, metric, rows.category),
                        Coordinate::new(row, col),
                    )
                })
        })
    }

    pub fn category(&self, category: CategoryKey) -> Option<&CategoryRows> {
        self.categories.iter().find(|rows| rows.category == category)
    }

    /// Candidate balance coordinates for a category, in probe order
    pub fn balance_window(&self, category: CategoryKey) -> Vec<Coordinate> {
        self.category(category)
            .map(|rows| {
                self.balance_offsets
                    .iter()
                    .map(|offset| Coordinate::new(rows.balance_base_row + offset, self.balance_column))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check the table for internal consistency
    ///
    /// Every category appears exactly once, no two fixed fields share a cell, no
    /// balance window overlaps another, and no balance candidate lands on a fixed
    /// field.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.balance_offsets.is_empty() {
            return Err(LayoutError::EmptyWindow);
        }

        let mut seen = HashSet::new();
        for rows in self.categories {
            if !seen.insert(rows.category) {
                return Err(LayoutError::DuplicateCategory(rows.category));
            }
        }
        if let Some(missing) = CategoryKey::ALL.into_iter().find(|c| !seen.contains(c)) {
            return Err(LayoutError::MissingCategory(missing));
        }

        // Asset choice doesn't matter for coordinates; ETF stands in for both
        let mut occupied: HashMap<Coordinate, String> = HashMap::new();
        for (code, coord) in self.fixed_fields(AssetType::Etf) {
            if let Some(existing) = occupied.insert(coord, code.to_string()) {
                return Err(LayoutError::DuplicateCoordinate {
                    first: existing,
                    second: code.to_string(),
                    row: coord.row,
                    col: coord.col,
                });
            }
        }

        let mut window_rows: HashMap<usize, CategoryKey> = HashMap::new();
        for rows in self.categories {
            for coord in self.balance_window(rows.category) {
                if let Some(other) = window_rows.insert(coord.row, rows.category) {
                    return Err(LayoutError::OverlappingWindows {
                        first: other,
                        second: rows.category,
                        row: coord.row,
                    });
                }
                if let Some(existing) = occupied.get(&coord) {
                    let balance = IndicatorCode::new(AssetType::Etf, MetricClass::Balance, rows.category);
                    return Err(LayoutError::DuplicateCoordinate {
                        first: existing.clone(),
                        second: balance.to_string(),
                        row: coord.row,
                        col: coord.col,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout_is_valid() {
        assert_eq!(STANDARD_LAYOUT.validate(), Ok(()));
    }

    #[test]
    fn test_fixed_fields_per_asset() {
        let fields: Vec<_> = STANDARD_LAYOUT.fixed_fields(AssetType::Reit).collect();
        assert_eq!(fields.len(), 28);
        assert!(fields.iter().all(|(code, coord)| {
            code.asset == AssetType::Reit && code.metric.is_fixed() && coord.col == 4
        }));

        let (code, coord) = fields[0];
        assert_eq!(code.to_string(), "JTMD.REIT.SAL.PROP.M");
        assert_eq!(coord, Coordinate::new(13, 4));

        let (code, coord) = fields[27];
        assert_eq!(code.to_string(), "JTMD.REIT.PURCH.OTHERFIN.M");
        assert_eq!(coord, Coordinate::new(59, 4));
    }

    #[test]
    fn test_balance_window() {
        let window = STANDARD_LAYOUT.balance_window(CategoryKey::Institutions);
        assert_eq!(
            window,
            vec![
                Coordinate::new(24, 6),
                Coordinate::new(25, 6),
                Coordinate::new(26, 6)
            ]
        );
    }

    #[test]
    fn test_duplicate_coordinate_detected() {
        const COLLIDING: [CategoryRows; 14] = {
            let mut table = [rows(CategoryKey::Proprietary, 13); 14];
            let mut i = 0;
            while i < 14 {
                table[i] = rows(CategoryKey::ALL[i], 100 + i * 5);
                i += 1;
            }
            table[1] = CategoryRows {
                category: CategoryKey::Brokerage,
                balance_base_row: 200,
                sales_row: 14,
                purchases_row: 201,
            };
            table[0] = rows(CategoryKey::Proprietary, 13);
            table
        };
        let layout = SheetLayout {
            categories: &COLLIDING,
            ..STANDARD_LAYOUT
        };
        match layout.validate() {
            Err(LayoutError::DuplicateCoordinate { row, col, .. }) => {
                assert_eq!((row, col), (14, 4));
            }
            other => panic!("Expected DuplicateCoordinate, got {other:?}"),
        }
    }

    #[test]
    fn test_overlapping_windows_detected() {
        const OVERLAP: [CategoryRows; 14] = {
            let mut table = [rows(CategoryKey::Proprietary, 13); 14];
            let mut i = 0;
            while i < 14 {
                table[i] = rows(CategoryKey::ALL[i], 10 + i * 3);
                i += 1;
            }
            // Brokerage's balance starts one row into Proprietary's window
            table[1] = CategoryRows {
                category: CategoryKey::Brokerage,
                balance_base_row: 11,
                sales_row: 200,
                purchases_row: 201,
            };
            table
        };
        let layout = SheetLayout {
            categories: &OVERLAP,
            ..STANDARD_LAYOUT
        };
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::OverlappingWindows { .. })
        ));
    }

    #[test]
    fn test_missing_category_detected() {
        const ONLY_PROP: [CategoryRows; 1] = [rows(CategoryKey::Proprietary, 13)];
        let layout = SheetLayout {
            categories: &ONLY_PROP,
            ..STANDARD_LAYOUT
        };
        assert_eq!(
            layout.validate(),
            Err(LayoutError::MissingCategory(CategoryKey::Brokerage))
        );
    }

    #[test]
    fn test_both_assets_share_layout() {
        assert!(std::ptr::eq(
            SheetLayout::for_asset(AssetType::Etf),
            SheetLayout::for_asset(AssetType::Reit)
        ));
    }
}
