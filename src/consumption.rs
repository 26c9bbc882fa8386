// src/consumption.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::PipelineConfig;

/// One interval's consumption for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    #[serde(rename = "Timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Device")]
    pub device: String,
    /// Finite and `>= 0`; deltas that overflow to infinity are dropped upstream.
    #[serde(rename = "Consumption_kwh")]
    pub consumption_kwh: f64,
    /// The raw delta was negative (meter rollover or reset) and was clamped to 0.
    #[serde(rename = "Clamped", default)]
    pub clamped: bool,
}

/// Device and date-range selection applied to a [`ConsumptionTable`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub device: Option<String>,
    /// Inclusive bounds on the timestamp's calendar date. Only applied when both are set.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RecordFilter {
    pub fn device(mut self, name: impl Into<String>) -> Self {
        self.device = Some(name.into());
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn matches(&self, record: &ConsumptionRecord) -> bool {
        if let Some(device) = &self.device {
            if &record.device != device {
                return false;
            }
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            let day = record.timestamp.date();
            if day < from || day > to {
                return false;
            }
        }
        true
    }
}

/// Which device names stay out of [`ConsumptionTable::devices`] and
/// [`ConsumptionTable::top_devices`]. All comparisons ignore case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceVisibility {
    hidden_names: Vec<String>,
    hidden_substrings: Vec<String>,
}

impl DeviceVisibility {
    /// Hide `hidden_devices` by name and anything containing a water keyword.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let fold = |v: &[String]| {
            let mut out: Vec<String> = v.iter().map(|s| s.to_lowercase()).collect();
            out.sort();
            out.dedup();
            out
        };
        Self {
            hidden_names: fold(config.hidden_devices.as_slice()),
            hidden_substrings: fold(config.water_keywords.as_slice()),
        }
    }

    pub fn is_visible(&self, device: &str) -> bool {
        let lower = device.to_lowercase();
        !self.hidden_names.iter().any(|n| *n == lower)
            && !self.hidden_substrings.iter().any(|s| lower.contains(s.as_str()))
    }
}

impl Default for DeviceVisibility {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// The long-format result of a pipeline run. Immutable once built; filtering
/// returns a new table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionTable {
    records: Vec<ConsumptionRecord>,
    #[serde(skip)]
    visibility: DeviceVisibility,
}

impl ConsumptionTable {
    pub(crate) fn from_records(records: Vec<ConsumptionRecord>) -> Self {
        Self {
            records,
            visibility: DeviceVisibility::default(),
        }
    }

    pub(crate) fn with_visibility(mut self, visibility: DeviceVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn records(&self) -> &[ConsumptionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct visible device names, sorted.
    pub fn devices(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .iter()
            .filter(|r| self.visibility.is_visible(&r.device))
            .map(|r| r.device.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn filter(&self, filter: &RecordFilter) -> ConsumptionTable {
        ConsumptionTable {
            records: self
                .records
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect(),
            visibility: self.visibility.clone(),
        }
    }

    pub fn total_consumption(&self) -> f64 {
        self.records.iter().map(|r| r.consumption_kwh).sum()
    }

    pub fn clamped_count(&self) -> usize {
        self.records.iter().filter(|r| r.clamped).count()
    }

    /// Sum per device, ordered by device name. Hidden devices are included.
    pub fn totals_by_device(&self) -> Vec<(String, f64)> {
        let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
        for r in &self.records {
            *sums.entry(r.device.as_str()).or_default() += r.consumption_kwh;
        }
        sums.into_iter().map(|(d, v)| (d.to_string(), v)).collect()
    }

    /// The `n` visible devices with the largest totals, largest first; ties by name.
    pub fn top_devices(&self, n: usize) -> Vec<(String, f64)> {
        let mut totals = self.totals_by_device();
        totals.retain(|(device, _)| self.visibility.is_visible(device));
        totals.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        totals.truncate(n);
        totals
    }

    /// Sum across all devices per calendar day, ascending.
    pub fn daily_totals(&self) -> Vec<(NaiveDate, f64)> {
        let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for r in &self.records {
            *sums.entry(r.timestamp.date()).or_default() += r.consumption_kwh;
        }
        sums.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn rec(day: u32, hour: u32, device: &str, kwh: f64) -> ConsumptionRecord {
        ConsumptionRecord {
            timestamp: at(day, hour),
            device: device.into(),
            consumption_kwh: kwh,
            clamped: false,
        }
    }

    fn sample() -> ConsumptionTable {
        ConsumptionTable::from_records(vec![
            rec(1, 6, "Press", 10.0),
            rec(2, 6, "Press", 5.0),
            rec(1, 12, "Lathe", 3.0),
            rec(3, 6, "Lathe", 30.0),
            rec(2, 6, "Oven", 15.0),
        ])
    }

    #[test]
    fn devices_sorted_unique() {
        assert_eq!(sample().devices(), vec!["Lathe", "Oven", "Press"]);
    }

    #[test]
    fn filter_by_device_and_range() {
        let t = sample();
        let press = t.filter(&RecordFilter::default().device("Press"));
        assert_eq!(press.len(), 2);

        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let window = t.filter(&RecordFilter::default().between(d(1), d(2)));
        assert_eq!(window.len(), 4);
        assert!(window.records().iter().all(|r| r.timestamp.date() <= d(2)));

        // half-open ranges are ignored
        let half = RecordFilter {
            from: Some(d(3)),
            ..Default::default()
        };
        assert_eq!(t.filter(&half).len(), t.len());

        // source table is untouched
        assert_eq!(t.len(), 5);
    }

    #[test]
    fn aggregates() {
        let t = sample();
        assert_eq!(t.total_consumption(), 63.0);
        assert_eq!(
            t.totals_by_device(),
            vec![
                ("Lathe".to_string(), 33.0),
                ("Oven".to_string(), 15.0),
                ("Press".to_string(), 15.0)
            ]
        );
        assert_eq!(
            t.top_devices(2),
            vec![("Lathe".to_string(), 33.0), ("Oven".to_string(), 15.0)]
        );
        let daily = t.daily_totals();
        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].1, 13.0);
        assert_eq!(daily[1].1, 20.0);
    }

    #[test]
    fn bookkeeping_and_water_devices_are_hidden_from_listings() {
        let t = ConsumptionTable::from_records(vec![
            rec(1, 6, "Press", 10.0),
            rec(1, 6, "WATER", 500.0),
            rec(1, 6, "Serial", 400.0),
            rec(1, 6, "Cooling Water", 300.0),
            rec(1, 6, "Oven", 20.0),
        ]);
        assert_eq!(t.devices(), vec!["Oven", "Press"]);
        assert_eq!(
            t.top_devices(5),
            vec![("Oven".to_string(), 20.0), ("Press".to_string(), 10.0)]
        );
        // totals still account for every record
        assert_eq!(t.totals_by_device().len(), 5);
        // visibility survives filtering
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let filtered = t.filter(&RecordFilter::default().between(d, d));
        assert_eq!(filtered.devices(), vec!["Oven", "Press"]);
    }

    #[test]
    fn hidden_list_comes_from_config() {
        let cfg = PipelineConfig {
            hidden_devices: vec!["OVEN".into()],
            water_keywords: vec![],
            ..PipelineConfig::default()
        };
        let t = sample().with_visibility(DeviceVisibility::from_config(&cfg));
        assert_eq!(t.devices(), vec!["Lathe", "Press"]);
        assert!(DeviceVisibility::from_config(&cfg).is_visible("Serial"));
    }

    #[test]
    fn serializes_with_presentation_names() -> anyhow::Result<()> {
        let json = serde_json::to_value(rec(1, 0, "Press", 1.5))?;
        assert_eq!(json["Device"], "Press");
        assert_eq!(json["Consumption_kwh"], 1.5);
        assert_eq!(json["Timestamp"], "2024-01-01T00:00:00");
        Ok(())
    }
}
