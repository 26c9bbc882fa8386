use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{
        Array, ArrayRef, BooleanArray, BooleanBuilder, Float64Array, Float64Builder, StringArray,
        StringBuilder, TimestampMillisecondArray, TimestampMillisecondBuilder,
    },
    datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit},
    record_batch::RecordBatch,
};
use chrono::DateTime;
use std::sync::Arc;

use crate::consumption::{ConsumptionRecord, ConsumptionTable};

pub const TIMESTAMP_FIELD: &str = "Timestamp";
pub const DEVICE_FIELD: &str = "Device";
pub const CONSUMPTION_FIELD: &str = "Consumption_kwh";
pub const CLAMPED_FIELD: &str = "Clamped";

/// Arrow schema of the long-format consumption table. Nothing is nullable.
pub fn consumption_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(
            TIMESTAMP_FIELD,
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
        Field::new(DEVICE_FIELD, DataType::Utf8, false),
        Field::new(CONSUMPTION_FIELD, DataType::Float64, false),
        Field::new(CLAMPED_FIELD, DataType::Boolean, false),
    ]))
}

/// Build a single [`RecordBatch`] holding every record of `table`.
pub fn to_record_batch(table: &ConsumptionTable) -> Result<RecordBatch> {
    let n = table.len();
    let mut ts = TimestampMillisecondBuilder::with_capacity(n);
    let mut device = StringBuilder::new();
    let mut kwh = Float64Builder::with_capacity(n);
    let mut clamped = BooleanBuilder::with_capacity(n);

    for r in table.records() {
        ts.append_value(r.timestamp.and_utc().timestamp_millis());
        device.append_value(&r.device);
        kwh.append_value(r.consumption_kwh);
        clamped.append_value(r.clamped);
    }

    let cols: Vec<ArrayRef> = vec![
        Arc::new(ts.finish()),
        Arc::new(device.finish()),
        Arc::new(kwh.finish()),
        Arc::new(clamped.finish()),
    ];
    RecordBatch::try_new(consumption_schema(), cols).context("building consumption record batch")
}

/// Inverse of [`to_record_batch`]; columns are looked up by name.
pub fn records_from_batch(batch: &RecordBatch) -> Result<Vec<ConsumptionRecord>> {
    let ts = column::<TimestampMillisecondArray>(batch, TIMESTAMP_FIELD)?;
    let device = column::<StringArray>(batch, DEVICE_FIELD)?;
    let kwh = column::<Float64Array>(batch, CONSUMPTION_FIELD)?;
    let clamped = column::<BooleanArray>(batch, CLAMPED_FIELD)?;

    (0..batch.num_rows())
        .map(|i| {
            let timestamp = DateTime::from_timestamp_millis(ts.value(i))
                .ok_or_else(|| anyhow!("timestamp out of range at row {}", i))?
                .naive_utc();
            Ok(ConsumptionRecord {
                timestamp,
                device: device.value(i).to_string(),
                consumption_kwh: kwh.value(i),
                clamped: clamped.value(i),
            })
        })
        .collect()
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("missing column {}", name))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("column {} has unexpected type", name))
}
