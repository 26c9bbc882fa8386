use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;

use crate::process::utils::clean_str;

/// Date-time layouts tried in order. `%.f` also matches when no fraction is present.
static DATETIME_FORMATS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S%.f",
        "%Y/%m/%d %H:%M",
        "%m/%d/%Y %H:%M:%S%.f",
        "%m/%d/%Y %H:%M",
        "%d.%m.%Y %H:%M:%S%.f",
        "%d.%m.%Y %H:%M",
    ]
});

/// Date-only layouts; midnight is assumed.
static DATE_FORMATS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"]);

/// Parse a meter export timestamp. Returns `None` for anything unrecognised;
/// callers treat that as a null timestamp.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = clean_str(raw);
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        return parse_all_digits(&s);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS.iter() {
        if let Ok(d) = NaiveDate::parse_from_str(&s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// `YYYYMMDD`, epoch seconds (9–10 digits) or epoch milliseconds (11–13 digits).
fn parse_all_digits(s: &str) -> Option<NaiveDateTime> {
    match s.len() {
        8 => NaiveDate::parse_from_str(s, "%Y%m%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        9..=10 => {
            let secs: i64 = s.parse().ok()?;
            DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
        }
        11..=13 => {
            let millis: i64 = s.parse().ok()?;
            DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}
