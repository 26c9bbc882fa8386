use crate::process::utils::dedupe_headers;

/// A table exactly as it came out of the loader: every cell is text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column names from the header row, made unique (`A`, `A.1`, …).
    pub headers: Vec<String>,
    /// Data rows, one `String` per field. Rows may be shorter than `headers`.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers: dedupe_headers(headers),
            rows,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (`row`, `col`); missing trailing fields read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Values of column `name` in row order, or `None` if there is no such column.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some((0..self.rows.len()).map(|r| self.cell(r, idx)).collect())
    }

    /// Keep only the columns for which `keep` returns true. Never fails.
    pub fn retain_columns<F: FnMut(&str) -> bool>(mut self, mut keep: F) -> Self {
        let kept: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| keep(h))
            .map(|(i, _)| i)
            .collect();
        if kept.len() == self.headers.len() {
            return self;
        }

        self.headers = kept.iter().map(|&i| self.headers[i].clone()).collect();
        self.rows = self
            .rows
            .iter()
            .map(|row| {
                kept.iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        self
    }
}
