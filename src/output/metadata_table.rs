use chrono::NaiveDateTime;
use csv::Writer;
use serde::Serialize;

use super::OutputError;
use crate::catalog::{catalog, DATASET_NAME};

const UNIT: &str = "Thousand JPY";
const FREQUENCY: &str = "Monthly";
const SOURCE: &str = "Japan Exchange Group (JPX)";
const DATA_TYPE: &str = "Numeric";
const CATEGORY: &str = "Trading Statistics";

/// One metadata row; field order is the column order
#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct MetadataRecord<'a> {
    code: String,
    description: String,
    unit: &'a str,
    frequency: &'a str,
    source: &'a str,
    dataset: &'a str,
    last_update: &'a str,
    next_release_date: &'a str,
    data_type: &'a str,
    category: &'a str,
}

/// Metadata for every catalog code, whether or not any period carried it
pub fn render_metadata_table(generated_at: NaiveDateTime) -> Result<String, OutputError> {
    let last_update = generated_at.format("%Y-%m-%dT%H:%M:%S").to_string();
    let mut wtr = Writer::from_writer(vec![]);

    for code in catalog() {
        wtr.serialize(MetadataRecord {
            code: code.to_string(),
            description: code.description(),
            unit: UNIT,
            frequency: FREQUENCY,
            source: SOURCE,
            dataset: DATASET_NAME,
            last_update: &last_update,
            next_release_date: "",
            data_type: DATA_TYPE,
            category: CATEGORY,
        })?;
    }

    let data = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(data)?)
}
