use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::Coordinate;

#[derive(Error, Debug)]
pub enum GridLoadError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {sheet} (available: {available:?})")]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },

    #[error("Failed to read sheet {sheet}: {msg}")]
    SheetRead { sheet: String, msg: String },
}

/// One raw cell value from a report sheet
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Empty,
}

impl Cell {
    /// Render the cell the way values appear in the output tables
    ///
    /// Text is trimmed; integral floats lose their fractional part so a balance
    /// of `152340.0` is written as `152340`. Blank cells and whitespace-only text
    /// are "not found" and yield None.
    pub fn formatted(&self) -> Option<String> {
        let rendered = match self {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) if !f.is_finite() => return None,
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
            Cell::Empty => return None,
        };

        if rendered.is_empty() {
            None
        } else {
            Some(rendered)
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(datetime) => Cell::Text(datetime.format("%Y-%m-%dT%H:%M:%S").to_string()),
                None => Cell::Float(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            // #N/A, #DIV/0! and friends carry no figure
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

/// Immutable row-major copy of one sheet
///
/// Indices are absolute: if the first used cell of the sheet is E14, it is
/// still found at (13, 4). Rows may have different lengths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Build a grid from a calamine range, restoring the leading blank rows and
    /// columns calamine trims off
    pub fn from_range(range: &Range<Data>) -> Self {
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; col_offset];
            cells.extend(row.iter().map(Cell::from));
            rows.push(cells);
        }

        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    pub fn at(&self, coord: Coordinate) -> Option<&Cell> {
        self.get(coord.row, coord.col)
    }
}

/// Loads the named sheet of a report workbook (.xls or .xlsx)
#[derive(Debug, Clone)]
pub struct GridLoader {
    sheet_name: String,
}

impl GridLoader {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn load(&self, path: &Path) -> Result<Grid, GridLoadError> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| GridLoadError::WorkbookOpen(format!("{}: {e}", path.display())))?;

        let available = workbook.sheet_names();
        if !available.iter().any(|name| name == &self.sheet_name) {
            return Err(GridLoadError::MissingSheet {
                sheet: self.sheet_name.clone(),
                available,
            });
        }

        let range = workbook
            .worksheet_range(&self.sheet_name)
            .map_err(|e| GridLoadError::SheetRead {
                sheet: self.sheet_name.clone(),
                msg: e.to_string(),
            })?;

        let grid = Grid::from_range(&range);
        debug!(
            "Sheet {} spans {:?} to {:?}",
            self.sheet_name,
            range.start(),
            range.end()
        );
        info!(
            "Loaded sheet {} from {} ({} rows)",
            self.sheet_name,
            path.display(),
            grid.height()
        );
        Ok(grid)
    }
}
