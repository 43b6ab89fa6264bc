use chrono::{DateTime, Duration, Utc};
use coldtrace_contracts::validate::{validate_create_alert, validate_create_device, validate_create_reading};
use coldtrace_contracts::{
    Alert, AlertSeverity, AlertType, CreateAlertInput, CreateDeviceInput, CreateReadingInput, Device,
    DeviceStats, DeviceStatus, Error, Reading, ReadingStatus,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

const LOW_BATTERY: f64 = 20.0;

/// Sites devices are spread across: name, latitude, longitude
const SITES: [(&str, f64, f64); 6] = [
    ("Central Pharmacy", 40.7128, -74.0060),
    ("Vaccine Depot North", 40.7831, -73.9712),
    ("Hospital Wing B", 40.6782, -73.9442),
    ("Distribution Hub", 40.7357, -74.1724),
    ("Clinic Eastside", 40.7282, -73.7949),
    ("Reefer Truck Yard", 40.6413, -73.7781),
];

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub devices: usize,
    pub readings_per_device: usize,
    pub interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    pub generated_at: DateTime<Utc>,
    pub devices: Vec<Device>,
    pub readings: Vec<Reading>,
    pub alerts: Vec<Alert>,
    pub stats: DeviceStats,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn id() -> String {
    Uuid::new_v4().to_string()
}

fn device_status(rng: &mut impl Rng) -> DeviceStatus {
    let roll: f64 = rng.gen();
    if roll < 0.1 {
        DeviceStatus::Offline
    } else if roll < 0.15 {
        DeviceStatus::Maintenance
    } else {
        DeviceStatus::Active
    }
}

fn generate_device(
    rng: &mut impl Rng,
    index: usize,
    created_at: DateTime<Utc>,
) -> Result<Device, Error> {
    let (site, lat, lon) = SITES[index % SITES.len()];
    let input = CreateDeviceInput {
        device_id: format!("CT-{:03}", index + 1),
        name: format!("Cold Unit {}", index + 1),
        location: site.to_string(),
        latitude: Some(round2(lat + rng.gen_range(-0.01..0.01))),
        longitude: Some(round2(lon + rng.gen_range(-0.01..0.01))),
        min_temp: None,
        max_temp: None,
    };
    validate_create_device(&input).map_err(Error::Validation)?;

    let mut device = input.into_device(id(), created_at);
    device.status = device_status(rng);
    Ok(device)
}

fn generate_temperature(rng: &mut impl Rng, device: &Device) -> f64 {
    let temperature = if rng.gen_bool(0.05) {
        rng.gen_range(device.min_temp - 4.0..device.max_temp + 6.0) // 5% excursions
    } else {
        rng.gen_range(device.min_temp + 1.0..device.max_temp - 1.0) // Normal range
    };
    round2(temperature)
}

fn temperature_alert(device: &Device, reading: &Reading) -> CreateAlertInput {
    let midpoint = (device.min_temp + device.max_temp) / 2.0;
    let (alert_type, threshold, direction) = if reading.temperature >= midpoint {
        (AlertType::TemperatureHigh, device.max_temp, "above")
    } else {
        (AlertType::TemperatureLow, device.min_temp, "below")
    };
    let severity = match reading.status {
        ReadingStatus::Critical => AlertSeverity::Critical,
        _ => AlertSeverity::Medium,
    };

    CreateAlertInput {
        device_id: device.id.clone(),
        alert_type,
        severity,
        message: format!(
            "{}: {:.2}°C is {} the {:.1}°C limit",
            device.name, reading.temperature, direction, threshold
        ),
        reading_id: Some(reading.id.clone()),
        temperature: Some(reading.temperature),
        threshold: Some(threshold),
    }
}

fn battery_alert(device: &Device, reading: &Reading, battery: f64) -> CreateAlertInput {
    CreateAlertInput {
        device_id: device.id.clone(),
        alert_type: AlertType::BatteryLow,
        severity: AlertSeverity::Low,
        message: format!("{}: battery at {:.0}%", device.name, battery),
        reading_id: Some(reading.id.clone()),
        temperature: None,
        threshold: Some(LOW_BATTERY),
    }
}

fn build_alert(
    rng: &mut impl Rng,
    input: CreateAlertInput,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Alert, Error> {
    validate_create_alert(&input).map_err(Error::Validation)?;

    // Older alerts are more likely to have been dealt with
    let resolved = created_at < now - Duration::hours(6) && rng.gen_bool(0.6);
    Ok(Alert {
        id: id(),
        device_id: input.device_id,
        reading_id: input.reading_id,
        alert_type: input.alert_type,
        severity: input.severity,
        message: input.message,
        temperature: input.temperature,
        threshold: input.threshold,
        resolved,
        resolved_at: resolved.then(|| created_at + Duration::minutes(45)),
        created_at,
    })
}

/// Start of the reading history and the devices' creation time. Fails when
/// the history does not fit chrono's date range.
fn history_bounds(
    opts: &SeedOptions,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), Error> {
    let too_long = || {
        Error::Config(format!(
            "{} readings every {} min do not fit before {}",
            opts.readings_per_device,
            opts.interval.num_minutes(),
            now
        ))
    };
    let count = i32::try_from(opts.readings_per_device).map_err(|_| too_long())?;
    let start = opts
        .interval
        .checked_mul(count)
        .and_then(|history| now.checked_sub_signed(history))
        .ok_or_else(too_long)?;
    let created_at = start.checked_sub_signed(Duration::days(30)).ok_or_else(too_long)?;
    Ok((start, created_at))
}

/// Generates devices with a reading history ending at `now` and the alerts
/// those readings would have raised.
pub fn generate(rng: &mut impl Rng, opts: &SeedOptions, now: DateTime<Utc>) -> Result<SeedData, Error> {
    let (start, created_at) = history_bounds(opts, now)?;

    let mut devices = Vec::new();
    let mut readings = Vec::new();
    let mut alerts = Vec::new();

    for index in 0..opts.devices {
        let mut device = generate_device(rng, index, created_at)?;
        let mut battery = rng.gen_range(35.0..100.0);
        let drain = rng.gen_range(0.05..0.6);
        let mut battery_alerted = false;

        for n in 0..opts.readings_per_device {
            let input = CreateReadingInput {
                device_id: device.id.clone(),
                temperature: generate_temperature(rng, &device),
                battery: Some(round2(battery)),
            };
            validate_create_reading(&input).map_err(Error::Validation)?;

            // n < readings_per_device, which history_bounds checked against i32
            let timestamp = start + opts.interval * (n as i32 + 1);
            let reading = Reading {
                id: id(),
                device_id: input.device_id.clone(),
                temperature: input.temperature,
                battery: input.battery,
                status: input.status_for(&device),
                timestamp,
            };

            if reading.status != ReadingStatus::Normal {
                alerts.push(build_alert(rng, temperature_alert(&device, &reading), timestamp, now)?);
            }
            if battery < LOW_BATTERY && !battery_alerted {
                battery_alerted = true;
                alerts.push(build_alert(rng, battery_alert(&device, &reading, battery), timestamp, now)?);
            }

            device.battery = reading.battery;
            device.last_seen = Some(timestamp);
            readings.push(reading);
            battery = (battery - drain).max(0.0);
        }

        debug!("Generated {} ({})", device.device_id, device.location);
        devices.push(device);
    }

    let stats = DeviceStats::from_records(&devices, readings.len() as u64, &alerts);
    Ok(SeedData {
        generated_at: now,
        devices,
        readings,
        alerts,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use coldtrace_contracts::{DeviceAnalytics, ReadingFilters, TemperatureStats, TimeRange};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap()
    }

    fn opts() -> SeedOptions {
        SeedOptions {
            devices: 5,
            readings_per_device: 48,
            interval: Duration::minutes(30),
        }
    }

    fn dataset() -> SeedData {
        let mut rng = StdRng::seed_from_u64(7);
        generate(&mut rng, &opts(), now()).unwrap()
    }

    #[test]
    fn test_counts() {
        let data = dataset();
        assert_eq!(data.devices.len(), 5);
        assert_eq!(data.readings.len(), 5 * 48);
        assert_eq!(data.stats.total_devices, 5);
        assert_eq!(data.stats.total_readings, 240);
        assert!(data.stats.is_consistent());
    }

    #[test]
    fn test_device_ids_are_sequential() {
        let data = dataset();
        let ids: Vec<&str> = data.devices.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(ids, vec!["CT-001", "CT-002", "CT-003", "CT-004", "CT-005"]);
    }

    #[test]
    fn test_history_ends_at_now() {
        let data = dataset();
        for device in &data.devices {
            assert_eq!(device.last_seen, Some(now()));
        }
        assert!(data.readings.iter().all(|r| r.timestamp <= now()));
    }

    #[test]
    fn test_every_excursion_raises_an_alert() {
        let data = dataset();
        let flagged = data
            .readings
            .iter()
            .filter(|r| r.status != ReadingStatus::Normal)
            .count();
        let temperature_alerts = data
            .alerts
            .iter()
            .filter(|a| a.alert_type != AlertType::BatteryLow)
            .count();
        assert_eq!(flagged, temperature_alerts);

        for alert in data.alerts.iter().filter(|a| a.resolved) {
            assert!(alert.resolved_at.unwrap() > alert.created_at);
        }
    }

    #[test]
    fn test_analytics_over_seeded_history() {
        let data = dataset();
        let device = &data.devices[0];
        let range = TimeRange::ending_at(now(), Duration::hours(24)).unwrap();
        let report = DeviceAnalytics::build(
            &device.id,
            range,
            &data.readings,
            0,
            std::time::Duration::from_secs(30 * 60),
        )
        .unwrap();

        assert_eq!(report.reading_count, 48);
        assert_eq!(report.uptime, 100.0);
        assert!(report.is_consistent());

        let own = ReadingFilters {
            device_id: Some(device.id.clone()),
            ..Default::default()
        };
        let readings: Vec<Reading> = data.readings.iter().filter(|r| own.matches(r)).cloned().collect();
        assert_eq!(report.temperature_stats, TemperatureStats::from_readings(&readings));
    }

    #[test]
    fn test_oversized_history_is_an_error() {
        let mut rng = StdRng::seed_from_u64(7);
        let opts = SeedOptions {
            devices: 1,
            readings_per_device: 1000,
            interval: Duration::minutes(144_000_000),
        };
        assert!(matches!(generate(&mut rng, &opts, now()), Err(Error::Config(_))));

        let opts = SeedOptions {
            devices: 1,
            readings_per_device: usize::MAX,
            interval: Duration::minutes(1),
        };
        assert!(matches!(generate(&mut rng, &opts, now()), Err(Error::Config(_))));
    }

    #[test]
    fn test_seed_document_round_trips() {
        let data = dataset();
        let text = serde_json::to_string(&data).unwrap();
        let back: SeedData = serde_json::from_str(&text).unwrap();
        assert_eq!(back.devices, data.devices);
        assert_eq!(back.alerts.len(), data.alerts.len());
        assert_eq!(back.stats, data.stats);
    }
}
