use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::consumption::{ConsumptionRecord, ConsumptionTable, DeviceVisibility};
use crate::error::{PipelineError, Result};
use crate::process::date_parser::parse_timestamp;
use crate::process::raw_table::RawTable;
use crate::process::sanitize::drop_named_columns;
use crate::process::utils::parse_numeric;

/// Cumulative readings of one meter, aligned to [`WideReading::timestamps`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSeries {
    pub name: String,
    pub readings: Vec<Option<f64>>,
}

impl DeviceSeries {
    /// `readings[i] - readings[i-1]`; the first entry, and any entry with a null
    /// operand, is `None`.
    pub fn first_difference(&self) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(self.readings.len());
        let mut prev: Option<Option<f64>> = None;
        for &cur in &self.readings {
            let delta = match (prev, cur) {
                (Some(Some(p)), Some(c)) => Some(c - p),
                _ => None,
            };
            out.push(delta);
            prev = Some(cur);
        }
        out
    }
}

/// Timestamped wide table: every timestamp parsed, rows in ascending order,
/// non-device columns removed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WideReading {
    pub timestamps: Vec<NaiveDateTime>,
    pub devices: Vec<DeviceSeries>,
}

impl WideReading {
    /// Validate, parse, drop and sort a sanitized raw table.
    pub fn from_raw(table: RawTable, config: &PipelineConfig) -> Result<Self> {
        let ts_name = config.timestamp_column.as_str();
        let ts_idx = table
            .column_index(ts_name)
            .ok_or_else(|| PipelineError::missing_column(ts_name))?;

        let parsed: Vec<Option<NaiveDateTime>> = (0..table.num_rows())
            .map(|r| parse_timestamp(table.cell(r, ts_idx)))
            .collect();

        let table = drop_named_columns(table, &config.drop_columns);

        // (timestamp, original row) for rows that parsed; sort_by is stable so
        // equal timestamps keep file order
        let mut order: Vec<(NaiveDateTime, usize)> = parsed
            .iter()
            .enumerate()
            .filter_map(|(row, ts)| ts.map(|t| (t, row)))
            .collect();
        let unparsed = table.num_rows() - order.len();
        if unparsed > 0 {
            debug!(unparsed, column = ts_name, "dropped rows with unparseable timestamps");
        }
        order.sort_by(|a, b| a.0.cmp(&b.0));

        let devices = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                name.as_str() != ts_name && !config.helper_columns.iter().any(|h| h == *name)
            })
            .map(|(col, name)| DeviceSeries {
                name: name.clone(),
                readings: order
                    .iter()
                    .map(|&(_, row)| parse_numeric(table.cell(row, col)))
                    .collect(),
            })
            .collect();

        Ok(Self {
            timestamps: order.into_iter().map(|(t, _)| t).collect(),
            devices,
        })
    }

    /// Difference, melt, drop nulls and overflowed deltas, clamp negatives.
    pub fn into_consumption(self) -> ConsumptionTable {
        let mut records = Vec::new();
        for series in &self.devices {
            for (ts, delta) in self.timestamps.iter().zip(series.first_difference()) {
                let Some(delta) = delta.filter(|d| d.is_finite()) else {
                    continue;
                };
                let clamped = delta < 0.0;
                records.push(ConsumptionRecord {
                    timestamp: *ts,
                    device: series.name.clone(),
                    consumption_kwh: if clamped { 0.0 } else { delta },
                    clamped,
                });
            }
        }
        ConsumptionTable::from_records(records)
    }
}

/// Turn a sanitized wide table of cumulative readings into per-interval consumption.
#[tracing::instrument(level = "debug", skip_all, fields(rows = table.num_rows(), columns = table.headers.len()))]
pub fn derive_consumption(table: RawTable, config: &PipelineConfig) -> Result<ConsumptionTable> {
    let wide = WideReading::from_raw(table, config)?;
    let (rows, devices) = (wide.timestamps.len(), wide.devices.len());
    let out = wide
        .into_consumption()
        .with_visibility(DeviceVisibility::from_config(config));
    info!(
        rows,
        devices,
        records = out.len(),
        clamped = out.clamped_count(),
        "derived consumption"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn first_difference_propagates_nulls() {
        let s = DeviceSeries {
            name: "A".into(),
            readings: vec![Some(1.0), Some(4.0), None, Some(10.0), Some(12.5)],
        };
        assert_eq!(
            s.first_difference(),
            vec![None, Some(3.0), None, None, Some(2.5)]
        );
    }

    #[test]
    fn missing_timestamp_column() {
        let err = derive_consumption(raw(&["When", "A"], &[]), &PipelineConfig::default())
            .unwrap_err();
        assert_eq!(err, PipelineError::missing_column("Date"));
    }

    #[test]
    fn sorts_before_differencing() -> anyhow::Result<()> {
        let t = raw(
            &["Date", "A"],
            &[
                &["2024-01-03", "130"],
                &["2024-01-01", "100"],
                &["2024-01-02", "110"],
            ],
        );
        let out = derive_consumption(t, &PipelineConfig::default())?;
        let got: Vec<_> = out
            .records()
            .iter()
            .map(|r| (r.timestamp, r.consumption_kwh))
            .collect();
        assert_eq!(got, vec![(day(2), 10.0), (day(3), 20.0)]);
        Ok(())
    }

    #[test]
    fn unparseable_timestamps_are_dropped_before_differencing() -> anyhow::Result<()> {
        let t = raw(
            &["Date", "A"],
            &[&["2024-01-01", "100"], &["garbage", "5000"], &["2024-01-02", "120"]],
        );
        let out = derive_consumption(t, &PipelineConfig::default())?;
        assert_eq!(out.len(), 1);
        assert_eq!(out.records()[0].consumption_kwh, 20.0);
        Ok(())
    }

    #[test]
    fn bookkeeping_and_helper_columns_are_not_devices() -> anyhow::Result<()> {
        let t = raw(
            &["S. No.", "Date", "Day", "Cwk", "Press"],
            &[
                &["1", "2024-01-01", "Mon", "1", "10"],
                &["2", "2024-01-02", "Tue", "1", "12"],
            ],
        );
        let out = derive_consumption(t, &PipelineConfig::default())?;
        assert_eq!(out.devices(), vec!["Press"]);
        Ok(())
    }

    #[test]
    fn negative_deltas_clamp_and_flag() -> anyhow::Result<()> {
        let t = raw(
            &["Date", "A"],
            &[&["2024-01-01", "100"], &["2024-01-02", "80"], &["2024-01-03", "85"]],
        );
        let out = derive_consumption(t, &PipelineConfig::default())?;
        let r = out.records();
        assert_eq!(r[0].consumption_kwh, 0.0);
        assert!(r[0].clamped);
        assert_eq!(r[1].consumption_kwh, 5.0);
        assert!(!r[1].clamped);
        Ok(())
    }

    #[test]
    fn overflowing_deltas_are_dropped() -> anyhow::Result<()> {
        let t = raw(
            &["Date", "A"],
            &[
                &["2024-01-01", "-1.7e308"],
                &["2024-01-02", "1.7e308"],
                &["2024-01-03", "1.7e308"],
            ],
        );
        let out = derive_consumption(t, &PipelineConfig::default())?;
        assert_eq!(out.len(), 1);
        assert_eq!(out.records()[0].timestamp, day(3));
        assert_eq!(out.records()[0].consumption_kwh, 0.0);
        assert!(out.records().iter().all(|r| r.consumption_kwh.is_finite()));
        Ok(())
    }

    #[test]
    fn zero_deltas_are_kept() -> anyhow::Result<()> {
        let t = raw(&["Date", "A"], &[&["2024-01-01", "7"], &["2024-01-02", "7"]]);
        let out = derive_consumption(t, &PipelineConfig::default())?;
        assert_eq!(out.len(), 1);
        assert_eq!(out.records()[0].consumption_kwh, 0.0);
        assert!(!out.records()[0].clamped);
        Ok(())
    }

    #[test]
    fn non_numeric_device_contributes_nothing() -> anyhow::Result<()> {
        let t = raw(
            &["Date", "Label", "A"],
            &[&["2024-01-01", "x", "1"], &["2024-01-02", "y", "2"]],
        );
        let out = derive_consumption(t, &PipelineConfig::default())?;
        assert_eq!(out.devices(), vec!["A"]);
        Ok(())
    }

    #[test]
    fn empty_table_yields_empty_output() -> anyhow::Result<()> {
        let out = derive_consumption(raw(&["Date", "A"], &[]), &PipelineConfig::default())?;
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn output_is_device_major() -> anyhow::Result<()> {
        let t = raw(
            &["Date", "B", "A"],
            &[
                &["2024-01-01", "1", "10"],
                &["2024-01-02", "2", "20"],
                &["2024-01-03", "4", "40"],
            ],
        );
        let out = derive_consumption(t, &PipelineConfig::default())?;
        let order: Vec<_> = out.records().iter().map(|r| r.device.as_str()).collect();
        assert_eq!(order, vec!["B", "B", "A", "A"]);
        Ok(())
    }
}
