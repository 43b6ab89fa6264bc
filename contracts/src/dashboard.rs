use crate::model::{AlertWithDevice, Device, DeviceStatus, Reading, ReadingWithDevice};
use crate::stats::DeviceStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on each recent-activity list in [`DashboardData`].
pub const RECENT_LIMIT: usize = 10;

/// Latest sample shown on a map pin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastReading {
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl From<&Reading> for LastReading {
    fn from(reading: &Reading) -> Self {
        Self {
            temperature: reading.temperature,
            battery: reading.battery,
            timestamp: reading.timestamp,
        }
    }
}

/// Map-pin view of a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLocationData {
    pub id: String,
    pub device_id: String,
    pub name: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: DeviceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reading: Option<LastReading>,
    pub alert_count: u64,
}

impl DeviceLocationData {
    pub fn from_device(device: &Device, last_reading: Option<&Reading>, alert_count: u64) -> Self {
        Self {
            id: device.id.clone(),
            device_id: device.device_id.clone(),
            name: device.name.clone(),
            location: device.location.clone(),
            latitude: device.latitude,
            longitude: device.longitude,
            status: device.status,
            last_reading: last_reading.map(LastReading::from),
            alert_count,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Home view payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub stats: DeviceStats,
    pub recent_alerts: Vec<AlertWithDevice>,
    pub recent_readings: Vec<ReadingWithDevice>,
    pub device_locations: Vec<DeviceLocationData>,
}

impl DashboardData {
    /// Orders recent lists newest first and keeps at most [`RECENT_LIMIT`]
    /// of each.
    pub fn new(
        stats: DeviceStats,
        mut recent_alerts: Vec<AlertWithDevice>,
        mut recent_readings: Vec<ReadingWithDevice>,
        device_locations: Vec<DeviceLocationData>,
    ) -> Self {
        recent_alerts.sort_by(|a, b| b.alert.created_at.cmp(&a.alert.created_at));
        recent_alerts.truncate(RECENT_LIMIT);
        recent_readings.sort_by(|a, b| b.reading.timestamp.cmp(&a.reading.timestamp));
        recent_readings.truncate(RECENT_LIMIT);

        Self {
            stats,
            recent_alerts,
            recent_readings,
            device_locations,
        }
    }
}
