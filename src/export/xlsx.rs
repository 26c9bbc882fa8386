use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::{fs, path::Path};
use tracing::info;

use crate::consumption::ConsumptionTable;
use crate::process::convert::{CONSUMPTION_FIELD, DEVICE_FIELD, TIMESTAMP_FIELD};

pub const SHEET_NAME: &str = "Processed Data";

/// Render `table` as an `.xlsx` workbook with a single `Processed Data` sheet.
pub fn to_xlsx_bytes(table: &ConsumptionTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let datetime = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, name) in [TIMESTAMP_FIELD, DEVICE_FIELD, CONSUMPTION_FIELD]
        .iter()
        .enumerate()
    {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }

    for (i, r) in table.records().iter().enumerate() {
        let row = u32::try_from(i + 1).context("too many rows for a worksheet")?;
        sheet.write_datetime_with_format(row, 0, &r.timestamp, &datetime)?;
        sheet.write_string(row, 1, &r.device)?;
        sheet.write_number(row, 2, r.consumption_kwh)?;
    }
    sheet.set_column_width(0, 20)?;

    workbook.save_to_buffer().context("serializing workbook")
}

pub fn write_xlsx<P: AsRef<Path>>(table: &ConsumptionTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_xlsx_bytes(table)?;
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), rows = table.len(), "wrote workbook");
    Ok(())
}
