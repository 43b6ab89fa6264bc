use crate::model::{Alert, AlertSeverity, Device, DeviceStatus, Reading};
use serde::{Deserialize, Serialize};

/// Fleet-wide counters shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStats {
    pub total_devices: u64,
    pub active_devices: u64,
    pub offline_devices: u64,
    pub total_readings: u64,
    pub active_alerts: u64,
    pub critical_alerts: u64,
}

impl DeviceStats {
    /// Counts devices by status and unresolved alerts by severity.
    pub fn from_records(devices: &[Device], total_readings: u64, alerts: &[Alert]) -> Self {
        let count_status =
            |status: DeviceStatus| devices.iter().filter(|d| d.status == status).count() as u64;
        let active: Vec<&Alert> = alerts.iter().filter(|a| a.is_active()).collect();

        Self {
            total_devices: devices.len() as u64,
            active_devices: count_status(DeviceStatus::Active),
            offline_devices: count_status(DeviceStatus::Offline),
            total_readings,
            active_alerts: active.len() as u64,
            critical_alerts: active
                .iter()
                .filter(|a| a.severity == AlertSeverity::Critical)
                .count() as u64,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.active_devices + self.offline_devices <= self.total_devices
            && self.critical_alerts <= self.active_alerts
    }
}

/// Aggregate over a set of temperatures. All fields are zero when
/// `count == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: u64,
}

impl TemperatureStats {
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0u64;

        for value in values.into_iter().filter(|v| v.is_finite()) {
            min = min.min(value);
            max = max.max(value);
            sum += value;
            count += 1;
        }

        if count == 0 {
            return Self::default();
        }

        // Summation error must not push the mean outside the observed range
        let avg = (sum / count as f64).clamp(min, max);
        Self {
            min,
            max,
            avg,
            count,
        }
    }

    pub fn from_readings(readings: &[Reading]) -> Self {
        Self::from_values(readings.iter().map(|r| r.temperature))
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_consistent(&self) -> bool {
        if self.count == 0 {
            self.min == 0.0 && self.max == 0.0 && self.avg == 0.0
        } else {
            self.min <= self.avg && self.avg <= self.max
        }
    }
}
