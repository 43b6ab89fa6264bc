use crate::model::{Alert, AlertSeverity, AlertType, Device, Reading, ReadingStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reading pushed to live subscribers. `timestamp` is when the sample was
/// taken, not when it was delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeReading {
    pub device_id: String,
    pub device_name: String,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
    pub status: ReadingStatus,
    pub timestamp: DateTime<Utc>,
}

impl RealtimeReading {
    pub fn new(device: &Device, reading: &Reading) -> Self {
        Self {
            device_id: device.device_id.clone(),
            device_name: device.name.clone(),
            temperature: reading.temperature,
            battery: reading.battery,
            status: reading.status,
            timestamp: reading.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeAlert {
    pub id: String,
    pub device_id: String,
    pub device_name: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl RealtimeAlert {
    pub fn new(device: &Device, alert: &Alert) -> Self {
        Self {
            id: alert.id.clone(),
            device_id: device.device_id.clone(),
            device_name: device.name.clone(),
            alert_type: alert.alert_type,
            severity: alert.severity,
            message: alert.message.clone(),
            temperature: alert.temperature,
            timestamp: alert.created_at,
        }
    }
}

/// Envelope for the push channel: `{"type": "reading", "payload": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum RealtimeEvent {
    Reading(RealtimeReading),
    Alert(RealtimeAlert),
}

impl RealtimeEvent {
    pub fn device_id(&self) -> &str {
        match self {
            RealtimeEvent::Reading(r) => &r.device_id,
            RealtimeEvent::Alert(a) => &a.device_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            RealtimeEvent::Reading(r) => r.timestamp,
            RealtimeEvent::Alert(a) => a.timestamp,
        }
    }

    /// Per-device channel subscribers join, e.g. `devices/CT-001`.
    pub fn channel(&self) -> String {
        format!("devices/{}", self.device_id())
    }
}

impl From<RealtimeReading> for RealtimeEvent {
    fn from(reading: RealtimeReading) -> Self {
        RealtimeEvent::Reading(reading)
    }
}

impl From<RealtimeAlert> for RealtimeEvent {
    fn from(alert: RealtimeAlert) -> Self {
        RealtimeEvent::Alert(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceStatus;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 12, 14, 30, 0).unwrap()
    }

    fn device() -> Device {
        Device {
            id: "clx1".to_string(),
            device_id: "CT-007".to_string(),
            name: "Van 7".to_string(),
            location: "Route 12".to_string(),
            latitude: None,
            longitude: None,
            status: DeviceStatus::Active,
            battery: Some(55.0),
            min_temp: 2.0,
            max_temp: 8.0,
            last_seen: None,
            created_at: t0() - Duration::days(30),
            updated_at: t0() - Duration::days(1),
        }
    }

    fn reading() -> Reading {
        Reading {
            id: "r1".to_string(),
            device_id: "clx1".to_string(),
            temperature: 8.5,
            battery: Some(55.0),
            status: ReadingStatus::Critical,
            timestamp: t0(),
        }
    }

    #[test]
    fn test_reading_event_uses_sample_time() {
        let event = RealtimeReading::new(&device(), &reading());
        assert_eq!(event.device_id, "CT-007");
        assert_eq!(event.device_name, "Van 7");
        assert_eq!(event.timestamp, t0());
    }

    #[test]
    fn test_alert_event() {
        let alert = Alert {
            id: "a1".to_string(),
            device_id: "clx1".to_string(),
            reading_id: Some("r1".to_string()),
            alert_type: AlertType::TemperatureHigh,
            severity: AlertSeverity::Critical,
            message: "8.5°C above 8.0°C".to_string(),
            temperature: Some(8.5),
            threshold: Some(8.0),
            resolved: false,
            resolved_at: None,
            created_at: t0(),
        };

        let event: RealtimeEvent = RealtimeAlert::new(&device(), &alert).into();
        assert_eq!(event.channel(), "devices/CT-007");
        assert_eq!(event.timestamp(), t0());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "alert");
        assert_eq!(json["payload"]["type"], "TEMPERATURE_HIGH");
        assert_eq!(json["payload"]["deviceName"], "Van 7");
    }

    #[test]
    fn test_event_round_trip() {
        let event: RealtimeEvent = RealtimeReading::new(&device(), &reading()).into();
        let text = serde_json::to_string(&event).unwrap();
        let back: RealtimeEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
    }
}
