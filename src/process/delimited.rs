use csv::ReaderBuilder;
use std::io::Cursor;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::process::raw_table::RawTable;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse delimited text whose first record is the header row.
///
/// Records with fewer or more fields than the header are accepted; extra
/// fields are ignored later by column lookup, missing ones read as empty.
pub fn read_delimited(content: &[u8], delimiter: u8) -> Result<RawTable> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    std::str::from_utf8(content)
        .map_err(|e| PipelineError::parse(format!("input is not valid UTF-8: {}", e)))?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(Cursor::new(content));

    let mut records = rdr.records();
    let headers: Vec<String> = match records.next() {
        Some(first) => first?.iter().map(|h| h.trim().to_string()).collect(),
        None => return Err(PipelineError::parse("no columns to parse from file")),
    };
    if headers.iter().all(String::is_empty) {
        return Err(PipelineError::parse("no columns to parse from file"));
    }

    let mut rows = Vec::new();
    for (idx, result) in records.enumerate() {
        let record = result.map_err(|e| {
            PipelineError::parse(format!("malformed record {}: {}", idx + 1, e))
        })?;
        // fully blank lines carry no reading
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(columns = headers.len(), rows = rows.len(), "parsed delimited text");
    Ok(RawTable::new(headers, rows))
}
