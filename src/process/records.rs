use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::process::raw_table::RawTable;

/// Parse structured-record JSON into a table.
///
/// Accepted shapes:
/// - `[{"Date": .., "A": ..}, ..]` (one object per row)
/// - `{"Date": [..], "A": [..]}` (one array per column)
/// - `{"Date": {"0": ..}, "A": {"0": ..}}` (one index-keyed object per column)
///
/// Column order follows first appearance in the document.
pub fn read_records(content: &[u8]) -> Result<RawTable> {
    let doc: Value = serde_json::from_slice(content)?;
    let table = match doc {
        Value::Array(items) => from_row_objects(items)?,
        Value::Object(columns) => from_column_map(columns)?,
        other => {
            return Err(PipelineError::parse(format!(
                "expected a JSON array or object at top level, found {}",
                type_name(&other)
            )))
        }
    };
    debug!(
        columns = table.headers.len(),
        rows = table.num_rows(),
        "parsed structured records"
    );
    Ok(table)
}

fn from_row_objects(items: Vec<Value>) -> Result<RawTable> {
    let mut headers: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut objects = Vec::with_capacity(items.len());

    for (i, item) in items.into_iter().enumerate() {
        let obj = match item {
            Value::Object(obj) => obj,
            other => {
                return Err(PipelineError::parse(format!(
                    "row {} is a JSON {}, expected an object",
                    i,
                    type_name(&other)
                )))
            }
        };
        for key in obj.keys() {
            if !index.contains_key(key) {
                index.insert(key.clone(), headers.len());
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .iter()
        .map(|obj| {
            let mut row = vec![String::new(); headers.len()];
            for (key, value) in obj {
                row[index[key]] = scalar_to_string(value);
            }
            row
        })
        .collect();
    Ok(RawTable::new(headers, rows))
}

fn from_column_map(columns: Map<String, Value>) -> Result<RawTable> {
    let headers: Vec<String> = columns.keys().cloned().collect();
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(headers.len());

    // row keys of the index-keyed shape, numbered in first-seen order
    let mut row_pos: HashMap<String, usize> = HashMap::new();

    for (name, value) in &columns {
        match value {
            Value::Array(values) => cells.push(values.iter().map(scalar_to_string).collect()),
            Value::Object(by_row) => {
                let mut col = Vec::new();
                for (key, v) in by_row {
                    let next = row_pos.len();
                    let pos = *row_pos.entry(key.clone()).or_insert(next);
                    if col.len() <= pos {
                        col.resize(pos + 1, String::new());
                    }
                    col[pos] = scalar_to_string(v);
                }
                cells.push(col);
            }
            other => {
                return Err(PipelineError::parse(format!(
                    "column '{}' is a JSON {}, expected an array or object",
                    name,
                    type_name(other)
                )))
            }
        }
    }

    let n_rows = cells.iter().map(Vec::len).max().unwrap_or(0);
    let rows = (0..n_rows)
        .map(|r| {
            cells
                .iter()
                .map(|col| col.get(r).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    Ok(RawTable::new(headers, rows))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        nested => nested.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
