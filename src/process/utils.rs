use std::collections::HashSet;

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Coerce a cell to a finite `f64`. Empty, non-numeric, NaN and infinite values
/// all come back as `None`.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned = clean_str(raw);
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.to_ascii_lowercase().as_str() {
        "true" => return Some(1.0),
        "false" => return Some(0.0),
        _ => {}
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Make header names unique the way spreadsheet tools do: the second `A`
/// becomes `A.1`, the third `A.2`, skipping names that already exist.
pub fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut out = Vec::with_capacity(headers.len());
    for name in headers {
        let mut candidate = name.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", name, n);
            n += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

/// Lower-cased extension including the dot, e.g. `".csv"`.
pub fn file_suffix(file_name: &str) -> Option<String> {
    let lower = file_name.trim().to_lowercase();
    let dot = lower.rfind('.')?;
    Some(lower[dot..].to_string())
}
