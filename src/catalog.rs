// Indicator catalog for the JTMD investor-type trading dataset
//
// The catalog is closed: every code is a (asset, metric, category) triple, and the
// sheet layout tables describe where each one lives in a monthly report.
// - codes: AssetType, MetricClass, CategoryKey, IndicatorCode
// - layout: fixed coordinates and balance search windows

pub mod codes;
pub mod layout;

pub use codes::{
    catalog, AssetType, CategoryKey, IndicatorCode, MetricClass, UnknownCode, CATALOG_SIZE,
    DATASET_NAME,
};
pub use layout::{CategoryRows, Coordinate, LayoutError, SheetLayout, STANDARD_LAYOUT};
