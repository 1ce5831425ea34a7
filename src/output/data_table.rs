//! The data table: codes across, periods down
//!
//! ```text
//! ,JTMD.ETF.BAL.PROP.M,JTMD.ETF.BAL.BROKER.M,...
//! ,"ETF, Balance, Proprietary","ETF, Balance, Brokerage",...
//! 2024-02,152340,98120,...
//! 2024-03,151002,,...
//! ```
use csv::{ReaderBuilder, Writer};

use super::OutputError;
use crate::catalog::{catalog, IndicatorCode};
use crate::dataset::{Dataset, ExtractionResult};
use crate::extract::Period;

pub fn render_data_table(dataset: &Dataset) -> Result<String, OutputError> {
    let codes: Vec<IndicatorCode> = catalog().collect();
    let mut wtr = Writer::from_writer(vec![]);

    let mut header = vec![String::new()];
    header.extend(codes.iter().map(|code| code.to_string()));
    wtr.write_record(&header)?;

    let mut descriptions = vec![String::new()];
    descriptions.extend(codes.iter().map(|code| code.description()));
    wtr.write_record(&descriptions)?;

    for (period, values) in dataset.iter() {
        let mut row = vec![period.to_string()];
        row.extend(codes.iter().map(|code| values.get(code).unwrap_or("").to_string()));
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(data)?)
}

/// Read a data table back into a dataset
///
/// Blank cells become absent codes. Unknown codes and malformed periods are
/// rejected rather than skipped.
pub fn parse_data_table(input: &str) -> Result<Dataset, OutputError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(input.as_bytes());
    let mut records = rdr.records();

    let header = records
        .next()
        .ok_or_else(|| OutputError::Malformed("missing code header row".to_string()))??;
    let codes = header
        .iter()
        .skip(1)
        .map(|field| {
            field
                .parse::<IndicatorCode>()
                .map_err(|e| OutputError::Malformed(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    records
        .next()
        .ok_or_else(|| OutputError::Malformed("missing description header row".to_string()))??;

    let mut periods = Vec::new();
    for record in records {
        let record = record?;
        let mut fields = record.iter();
        let period: Period = fields
            .next()
            .unwrap_or("")
            .parse()
            .map_err(|e: crate::extract::PeriodError| OutputError::Malformed(e.to_string()))?;

        let values: ExtractionResult = codes
            .iter()
            .zip(fields)
            .filter(|(_, value)| !value.is_empty())
            .map(|(code, value)| (*code, value.to_string()))
            .collect();
        periods.push((period, values));
    }

    Ok(periods.into_iter().collect())
}
