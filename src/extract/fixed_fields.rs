//! Sales and purchases figures read from fixed sheet coordinates
use tracing::debug;

use crate::catalog::{AssetType, SheetLayout};
use crate::dataset::ExtractionResult;
use crate::importers::Grid;

pub struct FixedFieldExtractor<'a> {
    layout: &'a SheetLayout,
}

impl<'a> FixedFieldExtractor<'a> {
    pub fn new(layout: &'a SheetLayout) -> Self {
        Self { layout }
    }

    /// Read every fixed field for `asset`
    ///
    /// Short sheets and blank cells omit the field instead of failing.
    pub fn extract(&self, grid: &Grid, asset: AssetType) -> ExtractionResult {
        let mut result = ExtractionResult::default();

        for (code, coord) in self.layout.fixed_fields(asset) {
            match grid.at(coord) {
                None => {
                    debug!(
                        "{} omitted: row {}, col {} outside the sheet",
                        code, coord.row, coord.col
                    );
                }
                Some(cell) => match cell.formatted() {
                    Some(value) => {
                        result.insert(code, value);
                    }
                    None => {
                        debug!("{} omitted: row {}, col {} is empty", code, coord.row, coord.col);
                    }
                },
            }
        }

        result
    }
}
