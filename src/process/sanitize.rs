use crate::process::raw_table::RawTable;
use tracing::debug;

/// Drop every column whose name contains one of `keywords` as a literal,
/// case-sensitive substring. Tables without such columns pass through unchanged.
pub fn remove_water_columns<S: AsRef<str>>(table: RawTable, keywords: &[S]) -> RawTable {
    if keywords.is_empty() {
        return table;
    }
    let before = table.headers.len();
    let table =
        table.retain_columns(|name| !keywords.iter().any(|k| name.contains(k.as_ref())));
    let dropped = before - table.headers.len();
    if dropped > 0 {
        debug!(dropped, "removed water-related columns");
    }
    table
}

/// Drop columns whose name equals one of `names`. Absent names are ignored.
pub fn drop_named_columns<S: AsRef<str>>(table: RawTable, names: &[S]) -> RawTable {
    if names.is_empty() {
        return table;
    }
    table.retain_columns(|name| !names.iter().any(|n| n.as_ref() == name))
}
