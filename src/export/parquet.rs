use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    file::properties::WriterProperties,
};
use std::{fs, fs::File, path::Path};
use tracing::{info, warn};

use crate::consumption::ConsumptionTable;
use crate::process::convert::{consumption_schema, records_from_batch, to_record_batch};

/// Write `table` as a single-row-group Parquet file.
///
/// Data goes to `<path>.tmp` first and is renamed into place once the writer closes.
/// The temp file is removed if any step fails.
pub fn write_parquet<P: AsRef<Path>>(table: &ConsumptionTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let tmp = path.with_extension("parquet.tmp");

    let batch = to_record_batch(table)?;
    let written = write_batch(&batch, &tmp).and_then(|_| {
        fs::rename(&tmp, path)
            .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))
    });
    if let Err(e) = written {
        if tmp.exists() {
            if let Err(rm) = fs::remove_file(&tmp) {
                warn!(path = %tmp.display(), error = %rm, "failed to remove temp file");
            }
        }
        return Err(e);
    }

    info!(path = %path.display(), rows = table.len(), "wrote parquet");
    Ok(())
}

fn write_batch(batch: &RecordBatch, tmp: &Path) -> Result<()> {
    let file = File::create(tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, consumption_schema(), Some(props))
        .context("creating Arrow writer")?;
    writer.write(batch).context("writing consumption batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}

/// Read back a file produced by [`write_parquet`].
pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<ConsumptionTable> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading Parquet metadata of {}", path.display()))?
        .build()?;

    let mut records = Vec::new();
    for batch in reader {
        records.extend(records_from_batch(&batch?)?);
    }
    Ok(ConsumptionTable::from_records(records))
}
