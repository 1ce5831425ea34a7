//! Balance figures located by a bounded search below each category's base row
use tracing::{debug, info};

use crate::catalog::{AssetType, CategoryKey, Coordinate, IndicatorCode, MetricClass, SheetLayout};
use crate::importers::Grid;

/// A balance found inside its search window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBalance {
    pub code: IndicatorCode,
    pub value: String,
    pub coord: Coordinate,
    /// Rows below the base row where the value was found
    pub offset: usize,
}

pub struct CategoryBalanceResolver<'a> {
    layout: &'a SheetLayout,
}

impl<'a> CategoryBalanceResolver<'a> {
    pub fn new(layout: &'a SheetLayout) -> Self {
        Self { layout }
    }

    /// Probe the category's window top-down and take the first non-empty cell
    pub fn resolve(
        &self,
        grid: &Grid,
        asset: AssetType,
        category: CategoryKey,
    ) -> Option<ResolvedBalance> {
        let code = IndicatorCode::new(asset, MetricClass::Balance, category);
        let window = self.layout.balance_window(category);

        let found = window.iter().enumerate().find_map(|(offset, coord)| {
            grid.at(*coord)
                .and_then(|cell| cell.formatted())
                .map(|value| ResolvedBalance {
                    code,
                    value,
                    coord: *coord,
                    offset,
                })
        });

        match &found {
            Some(balance) if balance.offset > 0 => {
                info!(
                    "{} found {} row(s) below base at row {} (layout drift)",
                    code, balance.offset, balance.coord.row
                );
            }
            Some(_) => {}
            None => {
                debug!(
                    "{} omitted: no value in rows {:?}, col {}",
                    code,
                    window.iter().map(|c| c.row).collect::<Vec<_>>(),
                    self.layout.balance_column
                );
            }
        }

        found
    }

    /// One resolution per category, in catalog order
    pub fn resolve_all(&self, grid: &Grid, asset: AssetType) -> Vec<ResolvedBalance> {
        CategoryKey::ALL
            .into_iter()
            .filter_map(|category| self.resolve(grid, asset, category))
            .collect()
    }
}
