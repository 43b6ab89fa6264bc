use crate::errors::{Error, Result};
use crate::model::{AlertSeverity, AlertType, Device, DeviceStatus, ReadingStatus};
use crate::validate::band_error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default acceptable band for a new device, in °C.
pub const DEFAULT_MIN_TEMP: f64 = 2.0;
pub const DEFAULT_MAX_TEMP: f64 = 8.0;

/// A partial update of `T`.
pub trait Patch<T> {
    /// Writes every present field onto `target`, leaving the rest untouched.
    fn apply_to(&self, target: &mut T);

    /// True when applying the patch would change nothing.
    fn is_empty(&self) -> bool;
}

fn merge<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviceInput {
    pub device_id: String,
    pub name: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,
}

impl CreateDeviceInput {
    /// Builds the stored entity, filling defaults for omitted fields.
    pub fn into_device(self, id: String, now: DateTime<Utc>) -> Device {
        Device {
            id,
            device_id: self.device_id,
            name: self.name,
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            status: DeviceStatus::Active,
            battery: None,
            min_temp: self.min_temp.unwrap_or(DEFAULT_MIN_TEMP),
            max_temp: self.max_temp.unwrap_or(DEFAULT_MAX_TEMP),
            last_seen: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial device update. `id` addresses the row; `latitude`/`longitude`
/// cannot be cleared through a patch, only replaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceInput {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,
}

impl UpdateDeviceInput {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Lifts a create request into a patch that sets every field it carries.
    pub fn from_create(id: impl Into<String>, create: CreateDeviceInput) -> Self {
        Self {
            id: id.into(),
            device_id: Some(create.device_id),
            name: Some(create.name),
            location: Some(create.location),
            latitude: create.latitude,
            longitude: create.longitude,
            status: None,
            min_temp: create.min_temp,
            max_temp: create.max_temp,
        }
    }

    /// Applies the patch and stamps `updated_at` when anything was present.
    /// A patch that would leave `minTemp >= maxTemp` is rejected and the
    /// device is left untouched.
    pub fn apply_at(&self, device: &mut Device, now: DateTime<Utc>) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let min_temp = self.min_temp.unwrap_or(device.min_temp);
        let max_temp = self.max_temp.unwrap_or(device.max_temp);
        if min_temp >= max_temp {
            return Err(Error::Validation(vec![band_error(min_temp, max_temp)]));
        }
        self.apply_to(device);
        device.updated_at = now;
        Ok(())
    }
}

impl Patch<Device> for UpdateDeviceInput {
    fn apply_to(&self, device: &mut Device) {
        merge(&mut device.device_id, &self.device_id);
        merge(&mut device.name, &self.name);
        merge(&mut device.location, &self.location);
        if self.latitude.is_some() {
            device.latitude = self.latitude;
        }
        if self.longitude.is_some() {
            device.longitude = self.longitude;
        }
        merge(&mut device.status, &self.status);
        merge(&mut device.min_temp, &self.min_temp);
        merge(&mut device.max_temp, &self.max_temp);
    }

    fn is_empty(&self) -> bool {
        self.device_id.is_none()
            && self.name.is_none()
            && self.location.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.status.is_none()
            && self.min_temp.is_none()
            && self.max_temp.is_none()
    }
}

/// New telemetry sample as posted by a device or gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReadingInput {
    pub device_id: String,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
}

impl CreateReadingInput {
    /// Status this reading gets against `device`'s band.
    pub fn status_for(&self, device: &Device) -> ReadingStatus {
        ReadingStatus::classify(self.temperature, device.min_temp, device.max_temp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertInput {
    pub device_id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn create() -> CreateDeviceInput {
        CreateDeviceInput {
            device_id: "CT-001".to_string(),
            name: "Fridge A".to_string(),
            location: "Pharmacy".to_string(),
            latitude: None,
            longitude: None,
            min_temp: None,
            max_temp: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_into_device_fills_defaults() {
        let device = create().into_device("clx1".to_string(), now());
        assert_eq!(device.status, DeviceStatus::Active);
        assert_eq!(device.min_temp, DEFAULT_MIN_TEMP);
        assert_eq!(device.max_temp, DEFAULT_MAX_TEMP);
        assert_eq!(device.created_at, device.updated_at);
    }

    #[test]
    fn test_patch_only_touches_present_fields() {
        let mut device = create().into_device("clx1".to_string(), now());
        let patch = UpdateDeviceInput {
            name: Some("Fridge B".to_string()),
            status: Some(DeviceStatus::Maintenance),
            ..UpdateDeviceInput::new("clx1")
        };

        patch.apply_to(&mut device);

        assert_eq!(device.name, "Fridge B");
        assert_eq!(device.status, DeviceStatus::Maintenance);
        assert_eq!(device.location, "Pharmacy");
        assert_eq!(device.device_id, "CT-001");
    }

    #[test]
    fn test_empty_patch_keeps_timestamp() {
        let mut device = create().into_device("clx1".to_string(), now());
        let patch = UpdateDeviceInput::new("clx1");
        assert!(patch.is_empty());

        patch.apply_at(&mut device, now() + Duration::hours(1)).unwrap();
        assert_eq!(device.updated_at, now());
    }

    #[test]
    fn test_apply_at_stamps_update() {
        let mut device = create().into_device("clx1".to_string(), now());
        let later = now() + Duration::hours(1);
        let patch = UpdateDeviceInput {
            max_temp: Some(10.0),
            ..UpdateDeviceInput::new("clx1")
        };

        patch.apply_at(&mut device, later).unwrap();
        assert_eq!(device.max_temp, 10.0);
        assert_eq!(device.updated_at, later);
    }

    #[test]
    fn test_patch_cannot_invert_band() {
        let mut device = create().into_device("clx1".to_string(), now());
        let patch = UpdateDeviceInput {
            name: Some("Fridge B".to_string()),
            min_temp: Some(9.0),
            ..UpdateDeviceInput::new("clx1")
        };

        match patch.apply_at(&mut device, now() + Duration::hours(1)) {
            Err(Error::Validation(errors)) => assert_eq!(errors[0].field, "minTemp"),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(device.min_temp, DEFAULT_MIN_TEMP);
        assert_eq!(device.name, "Fridge A");
        assert_eq!(device.updated_at, now());

        // Moving both bounds together is fine
        let patch = UpdateDeviceInput {
            min_temp: Some(9.0),
            max_temp: Some(12.0),
            ..UpdateDeviceInput::new("clx1")
        };
        patch.apply_at(&mut device, now()).unwrap();
        assert_eq!((device.min_temp, device.max_temp), (9.0, 12.0));
    }

    #[test]
    fn test_update_requires_only_id() {
        let patch: UpdateDeviceInput = serde_json::from_value(json!({"id": "clx1"})).unwrap();
        assert_eq!(patch, UpdateDeviceInput::new("clx1"));

        let missing_id = serde_json::from_value::<UpdateDeviceInput>(json!({"name": "x"}));
        assert!(missing_id.is_err());
    }

    #[test]
    fn test_update_fields_are_independent() {
        let patch: UpdateDeviceInput =
            serde_json::from_value(json!({"id": "clx1", "location": "Ward 3"})).unwrap();
        assert_eq!(patch.location.as_deref(), Some("Ward 3"));
        assert!(patch.name.is_none());
        assert!(patch.status.is_none());

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, json!({"id": "clx1", "location": "Ward 3"}));
    }

    #[test]
    fn test_from_create_sets_carried_fields() {
        let patch = UpdateDeviceInput::from_create("clx1", create());
        assert_eq!(patch.name.as_deref(), Some("Fridge A"));
        assert!(patch.min_temp.is_none());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_alert_input_type_field() {
        let input: CreateAlertInput = serde_json::from_value(json!({
            "deviceId": "clx1",
            "type": "BATTERY_LOW",
            "severity": "MEDIUM",
            "message": "Battery at 12%"
        }))
        .unwrap();
        assert_eq!(input.alert_type, AlertType::BatteryLow);
        assert!(input.reading_id.is_none());
    }

    #[test]
    fn test_reading_status_for_device() {
        let device = create().into_device("clx1".to_string(), now());
        let input = CreateReadingInput {
            device_id: "clx1".to_string(),
            temperature: 11.0,
            battery: None,
        };
        assert_eq!(input.status_for(&device), ReadingStatus::Critical);
    }
}
