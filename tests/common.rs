#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};

use jtmd_pipeline::catalog::STANDARD_LAYOUT;

pub enum Fixture {
    Number(f64),
    Text(&'static str),
}

/// Write a single-sheet workbook with the given cells (0-based row, col)
pub fn write_workbook(
    dir: &Path,
    file_name: &str,
    sheet: &str,
    cells: &[(usize, usize, Fixture)],
) -> PathBuf {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).unwrap();

    for (row, col, value) in cells {
        let (row, col) = (*row as u32, *col as u16);
        match value {
            Fixture::Number(n) => worksheet.write_number(row, col, *n).unwrap(),
            Fixture::Text(s) => worksheet.write_string(row, col, *s).unwrap(),
        };
    }

    let path = dir.join(file_name);
    workbook.save(&path).unwrap();
    path
}

/// Cells for a fully populated report
///
/// Every category gets sales, purchases and a balance on its base row. Values
/// are `seed + 10 * category_index + metric` so each code has a distinct figure.
pub fn full_report_cells(seed: f64) -> Vec<(usize, usize, Fixture)> {
    let layout = &STANDARD_LAYOUT;
    let mut cells = Vec::new();
    for (i, rows) in layout.categories.iter().enumerate() {
        let base = seed + 10.0 * i as f64;
        cells.push((rows.balance_base_row, layout.balance_column, Fixture::Number(base)));
        cells.push((rows.sales_row, layout.trade_column, Fixture::Number(base + 1.0)));
        cells.push((rows.purchases_row, layout.trade_column, Fixture::Number(base + 2.0)));
    }
    cells
}

pub fn write_full_report(dir: &Path, file_name: &str, seed: f64) -> PathBuf {
    write_workbook(dir, file_name, "Value", &full_report_cells(seed))
}
