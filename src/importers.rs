// ! Source acquisition and workbook loading for the monthly reports

pub mod fetcher;
pub mod grid_loader;

// Re-export commonly used items
pub use fetcher::{DirectoryFetcher, FetchError, Fetcher};
pub use grid_loader::{Cell, Grid, GridLoadError, GridLoader};
