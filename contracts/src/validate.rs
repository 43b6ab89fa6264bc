use crate::api::ValidationError;
use crate::input::{
    CreateAlertInput, CreateDeviceInput, CreateReadingInput, UpdateDeviceInput, DEFAULT_MAX_TEMP,
    DEFAULT_MIN_TEMP,
};
use tracing::debug;

const TEMP_MIN: f64 = -100.0;
const TEMP_MAX: f64 = 100.0;
const BATTERY_MIN: f64 = 0.0;
const BATTERY_MAX: f64 = 100.0;
const LATITUDE_LIMIT: f64 = 90.0;
const LONGITUDE_LIMIT: f64 = 180.0;

/// Collects field failures so one response can report all of them.
#[derive(Debug, Default)]
struct Collector {
    errors: Vec<ValidationError>,
}

impl Collector {
    fn not_blank(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.errors
                .push(ValidationError::new(field, format!("{} cannot be empty", field)).with_value(value));
        }
    }

    fn in_range(&mut self, field: &str, value: f64, min: f64, max: f64) {
        if !value.is_finite() || value < min || value > max {
            self.errors.push(
                ValidationError::new(field, format!("{} out of range [{}, {}]", field, min, max))
                    .with_value(value),
            );
        }
    }

    fn optional_in_range(&mut self, field: &str, value: Option<f64>, min: f64, max: f64) {
        if let Some(value) = value {
            self.in_range(field, value, min, max);
        }
    }

    fn band(&mut self, min_temp: Option<f64>, max_temp: Option<f64>) {
        self.optional_in_range("minTemp", min_temp, TEMP_MIN, TEMP_MAX);
        self.optional_in_range("maxTemp", max_temp, TEMP_MIN, TEMP_MAX);
    }

    fn ordered(&mut self, min: f64, max: f64) {
        if min >= max {
            self.errors.push(band_error(min, max));
        }
    }

    fn coordinates(&mut self, latitude: Option<f64>, longitude: Option<f64>) {
        self.optional_in_range("latitude", latitude, -LATITUDE_LIMIT, LATITUDE_LIMIT);
        self.optional_in_range("longitude", longitude, -LONGITUDE_LIMIT, LONGITUDE_LIMIT);
    }

    fn finish(self, what: &str) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            debug!("Rejected {} with {} invalid field(s)", what, self.errors.len());
            Err(self.errors)
        }
    }
}

/// The error reported for a band whose lower bound is not below its upper one.
pub fn band_error(min_temp: f64, max_temp: f64) -> ValidationError {
    ValidationError::new("minTemp", format!("minTemp must be lower than maxTemp ({})", max_temp))
        .with_value(min_temp)
}

pub fn validate_create_device(input: &CreateDeviceInput) -> Result<(), Vec<ValidationError>> {
    let mut c = Collector::default();
    c.not_blank("deviceId", &input.device_id);
    c.not_blank("name", &input.name);
    c.not_blank("location", &input.location);
    c.coordinates(input.latitude, input.longitude);
    c.band(input.min_temp, input.max_temp);
    if input.min_temp.is_some() || input.max_temp.is_some() {
        // A missing bound is filled with its default on create
        c.ordered(
            input.min_temp.unwrap_or(DEFAULT_MIN_TEMP),
            input.max_temp.unwrap_or(DEFAULT_MAX_TEMP),
        );
    }
    c.finish("device")
}

/// Only present fields are checked; a bare `id` is a valid no-op patch.
/// A single band bound can only be checked against the stored device, which
/// `UpdateDeviceInput::apply_at` does.
pub fn validate_update_device(input: &UpdateDeviceInput) -> Result<(), Vec<ValidationError>> {
    let mut c = Collector::default();
    c.not_blank("id", &input.id);
    if let Some(device_id) = &input.device_id {
        c.not_blank("deviceId", device_id);
    }
    if let Some(name) = &input.name {
        c.not_blank("name", name);
    }
    if let Some(location) = &input.location {
        c.not_blank("location", location);
    }
    c.coordinates(input.latitude, input.longitude);
    c.band(input.min_temp, input.max_temp);
    if let (Some(min), Some(max)) = (input.min_temp, input.max_temp) {
        c.ordered(min, max);
    }
    c.finish("device update")
}

pub fn validate_create_reading(input: &CreateReadingInput) -> Result<(), Vec<ValidationError>> {
    let mut c = Collector::default();
    c.not_blank("deviceId", &input.device_id);
    c.in_range("temperature", input.temperature, TEMP_MIN, TEMP_MAX);
    c.optional_in_range("battery", input.battery, BATTERY_MIN, BATTERY_MAX);
    c.finish("reading")
}

pub fn validate_create_alert(input: &CreateAlertInput) -> Result<(), Vec<ValidationError>> {
    let mut c = Collector::default();
    c.not_blank("deviceId", &input.device_id);
    c.not_blank("message", &input.message);
    if let Some(reading_id) = &input.reading_id {
        c.not_blank("readingId", reading_id);
    }
    c.optional_in_range("temperature", input.temperature, TEMP_MIN, TEMP_MAX);
    c.optional_in_range("threshold", input.threshold, TEMP_MIN, TEMP_MAX);
    c.finish("alert")
}
