use crate::errors::{Error, Result};
use crate::model::Reading;
use crate::stats::TemperatureStats;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Closed interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// The window of length `span` that ends at `end`.
    pub fn ending_at(end: DateTime<Utc>, span: Duration) -> Result<Self> {
        Self::new(end - span, end)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    /// Number of samples a device reporting every `interval` should produce.
    pub fn expected_samples(&self, interval: std::time::Duration) -> u64 {
        let interval_ms = interval.as_millis();
        if interval_ms == 0 {
            return 0;
        }
        let span_ms = self.span().num_milliseconds().max(0) as u128;
        (span_ms / interval_ms) as u64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
}

/// Per-device report over a time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAnalytics {
    pub device_id: String,
    pub time_range: TimeRange,
    pub temperature_stats: TemperatureStats,
    pub reading_count: u64,
    pub alert_count: u64,
    /// Percentage of expected samples actually received, in `[0, 100]`
    pub uptime: f64,
    pub time_series: Vec<TimeSeriesPoint>,
}

impl DeviceAnalytics {
    /// Builds the report from `readings`, keeping only samples of
    /// `device_id` that fall inside `time_range`. The series comes out in
    /// ascending timestamp order. Fails on an inverted range.
    pub fn build(
        device_id: &str,
        time_range: TimeRange,
        readings: &[Reading],
        alert_count: u64,
        expected_interval: std::time::Duration,
    ) -> Result<Self> {
        let time_range = TimeRange::new(time_range.start, time_range.end)?;
        let mut window: Vec<&Reading> = readings
            .iter()
            .filter(|r| {
                r.device_id == device_id
                    && time_range.contains(r.timestamp)
                    && r.temperature.is_finite()
            })
            .collect();
        window.sort_by_key(|r| r.timestamp);

        let dropped = readings.len() - window.len();
        if dropped > 0 {
            debug!(
                "Analytics for {}: skipped {} unusable reading(s)",
                device_id, dropped
            );
        }

        let reading_count = window.len() as u64;
        let expected = time_range.expected_samples(expected_interval);
        let uptime = uptime_percent(reading_count, expected);

        Ok(Self {
            device_id: device_id.to_string(),
            time_range,
            temperature_stats: TemperatureStats::from_values(window.iter().map(|r| r.temperature)),
            reading_count,
            alert_count,
            uptime,
            time_series: window
                .iter()
                .map(|r| TimeSeriesPoint {
                    timestamp: r.timestamp,
                    temperature: r.temperature,
                    battery: r.battery,
                })
                .collect(),
        })
    }

    /// True when the series is ascending and inside `time_range`.
    pub fn is_consistent(&self) -> bool {
        let ordered = self
            .time_series
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp);
        let bounded = self
            .time_series
            .iter()
            .all(|point| self.time_range.contains(point.timestamp));
        ordered && bounded && (0.0..=100.0).contains(&self.uptime)
    }
}

fn uptime_percent(received: u64, expected: u64) -> f64 {
    if expected == 0 {
        return if received > 0 { 100.0 } else { 0.0 };
    }
    let pct = (received as f64 / expected as f64 * 100.0).min(100.0);
    (pct * 100.0).round() / 100.0
}
