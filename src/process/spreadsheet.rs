use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use std::io::Cursor;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::process::raw_table::RawTable;

/// Read the first worksheet of an `.xlsx` workbook. The first row is the header.
pub fn read_first_sheet(content: &[u8]) -> Result<RawTable> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(content))?;
    let sheet_name = workbook.sheet_names().first().cloned();
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::parse("workbook contains no worksheets"))??;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(row) => row.iter().map(|c| cell_to_string(c).trim().to_string()).collect(),
        None => return Err(PipelineError::parse("no columns to parse from file")),
    };

    let rows: Vec<Vec<String>> = rows_iter
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .collect();

    debug!(
        sheet = sheet_name.as_deref().unwrap_or("?"),
        columns = headers.len(),
        rows = rows.len(),
        "parsed worksheet"
    );
    Ok(RawTable::new(headers, rows))
}

/// Render a cell as the text a delimited export would have carried.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_xlsxwriter::{Format, Workbook};

    fn build_workbook() -> anyhow::Result<Vec<u8>> {
        let mut wb = Workbook::new();
        let date_fmt = Format::new().set_num_format("yyyy-mm-dd");
        let sheet = wb.add_worksheet();
        sheet.set_name("Readings")?;
        sheet.write_string(0, 0, "Date")?;
        sheet.write_string(0, 1, "MachineA")?;
        sheet.write_string(0, 2, "Note")?;
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        sheet.write_datetime_with_format(1, 0, &day, &date_fmt)?;
        sheet.write_number(1, 1, 100.0)?;
        sheet.write_boolean(1, 2, true)?;
        let second = wb.add_worksheet();
        second.write_string(0, 0, "ignored")?;
        Ok(wb.save_to_buffer()?)
    }

    #[test]
    fn reads_first_sheet_only() -> anyhow::Result<()> {
        let table = read_first_sheet(&build_workbook()?)?;
        assert_eq!(table.headers, vec!["Date", "MachineA", "Note"]);
        assert_eq!(table.num_rows(), 1);
        assert!(table.cell(0, 0).starts_with("2024-01-01 00:00:00"));
        assert_eq!(table.cell(0, 1), "100");
        assert_eq!(table.cell(0, 2), "true");
        Ok(())
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let err = read_first_sheet(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
    }
}
