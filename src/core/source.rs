use crate::domain::model::RawRecord;
use crate::utils::error::Result;
use std::collections::HashMap;

/// Parses a delimited table with a header row into raw records.
///
/// Columns are renamed through `field_mapping` when given. Short rows are padded
/// with empty values; cells beyond the header are dropped. Bytes that are not valid
/// UTF-8 become U+FFFD so the row still reaches the validators.
pub fn read_raw_records(
    data: &[u8],
    delimiter: u8,
    field_mapping: Option<&HashMap<String, String>>,
) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|header| {
            let header = String::from_utf8_lossy(header);
            let header = header.trim();
            field_mapping
                .and_then(|mapping| mapping.get(header))
                .cloned()
                .unwrap_or_else(|| header.to_string())
        })
        .collect();

    tracing::debug!("Source columns: {}", headers.join(", "));

    let mut records = Vec::new();
    for (index, row) in reader.byte_records().enumerate() {
        let row = row?;
        if std::str::from_utf8(row.as_slice()).is_err() {
            tracing::warn!("Row {} contains invalid UTF-8; undecodable bytes replaced", index);
        }
        if row.len() > headers.len() {
            tracing::debug!(
                "Row {} has {} cells but only {} columns; extra cells ignored",
                index,
                row.len(),
                headers.len()
            );
        }

        let pairs = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = row.get(i).map(String::from_utf8_lossy).unwrap_or_default();
                (header.clone(), value.into_owned())
            });
        records.push(RawRecord::from_pairs(pairs));
    }

    Ok(records)
}
