use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Share of a device's temperature band treated as the warning margin.
const WARNING_MARGIN_RATIO: f64 = 0.1;

/// Operational state of a monitored device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "DeviceStatus", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    Active,
    Inactive,
    Maintenance,
    Offline,
}

/// Classification of a single reading against its device's band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "ReadingStatus", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingStatus {
    Normal,
    Warning,
    Critical,
}

impl ReadingStatus {
    /// Classifies a temperature against the `[min_temp, max_temp]` band.
    ///
    /// Outside the band is critical. Inside the band but within 10% of its
    /// width from either bound is a warning.
    pub fn classify(temperature: f64, min_temp: f64, max_temp: f64) -> Self {
        if temperature < min_temp || temperature > max_temp {
            return ReadingStatus::Critical;
        }

        let margin = (max_temp - min_temp) * WARNING_MARGIN_RATIO;
        if temperature < min_temp + margin || temperature > max_temp - margin {
            ReadingStatus::Warning
        } else {
            ReadingStatus::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "AlertType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    TemperatureHigh,
    TemperatureLow,
    BatteryLow,
    DeviceOffline,
    SensorError,
}

/// Alert severity, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "AlertSeverity", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Cold-chain sensor as stored in the `Device` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub device_id: String,
    pub name: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: DeviceStatus,
    pub battery: Option<f64>,
    pub min_temp: f64,
    pub max_temp: f64,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One telemetry sample. `device_id` references `Device::id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Reading {
    pub id: String,
    pub device_id: String,
    pub temperature: f64,
    pub battery: Option<f64>,
    pub status: ReadingStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub device_id: String,
    pub reading_id: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub temperature: Option<f64>,
    pub threshold: Option<f64>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn is_active(&self) -> bool {
        !self.resolved
    }
}

// Join shapes. The parent entity is flattened so the wire form matches an
// ORM `include`: `{ ...device, "readings": [...] }`.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceWithReadings {
    #[serde(flatten)]
    pub device: Device,
    pub readings: Vec<Reading>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceWithAlertsAndReadings {
    #[serde(flatten)]
    pub device: Device,
    pub alerts: Vec<Alert>,
    pub readings: Vec<Reading>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingWithDevice {
    #[serde(flatten)]
    pub reading: Reading,
    pub device: Device,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertWithDevice {
    #[serde(flatten)]
    pub alert: Alert,
    pub device: Device,
}
