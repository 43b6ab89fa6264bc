use crate::model::{Alert, AlertSeverity, AlertType, Device, DeviceStatus, Reading, ReadingStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Encode, Postgres, QueryBuilder, Type};

/// Appends `WHERE a AND b ...` to a query, binding every value.
struct WhereClause<'q, 'args> {
    qb: &'q mut QueryBuilder<'args, Postgres>,
    first: bool,
}

impl<'q, 'args> WhereClause<'q, 'args> {
    fn new(qb: &'q mut QueryBuilder<'args, Postgres>) -> Self {
        Self { qb, first: true }
    }

    fn next(&mut self) -> &mut QueryBuilder<'args, Postgres> {
        self.qb.push(if self.first { " WHERE " } else { " AND " });
        self.first = false;
        &mut *self.qb
    }

    fn cmp<T>(&mut self, column: &str, op: &str, value: Option<T>)
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.next()
                .push(format!("\"{}\" {} ", column, op))
                .push_bind(value);
        }
    }
}

fn within(ts: DateTime<Utc>, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    start.map_or(true, |start| ts >= start) && end.map_or(true, |end| ts <= end)
}

/// Escapes `LIKE` wildcards so the term is matched literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<AlertType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<AlertSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl AlertFilters {
    pub fn matches(&self, alert: &Alert) -> bool {
        self.device_id.as_ref().map_or(true, |id| *id == alert.device_id)
            && self.alert_type.map_or(true, |t| t == alert.alert_type)
            && self.severity.map_or(true, |s| s == alert.severity)
            && self.resolved.map_or(true, |r| r == alert.resolved)
            && within(alert.created_at, self.start_date, self.end_date)
    }

    pub fn push_where<'args>(&self, qb: &mut QueryBuilder<'args, Postgres>) {
        let mut clause = WhereClause::new(qb);
        clause.cmp("deviceId", "=", self.device_id.clone());
        clause.cmp("type", "=", self.alert_type);
        clause.cmp("severity", "=", self.severity);
        clause.cmp("resolved", "=", self.resolved);
        clause.cmp("createdAt", ">=", self.start_date);
        clause.cmp("createdAt", "<=", self.end_date);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReadingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,
}

impl ReadingFilters {
    pub fn matches(&self, reading: &Reading) -> bool {
        self.device_id.as_ref().map_or(true, |id| *id == reading.device_id)
            && self.status.map_or(true, |s| s == reading.status)
            && within(reading.timestamp, self.start_date, self.end_date)
            && self.min_temp.map_or(true, |min| reading.temperature >= min)
            && self.max_temp.map_or(true, |max| reading.temperature <= max)
    }

    pub fn push_where<'args>(&self, qb: &mut QueryBuilder<'args, Postgres>) {
        let mut clause = WhereClause::new(qb);
        clause.cmp("deviceId", "=", self.device_id.clone());
        clause.cmp("status", "=", self.status);
        clause.cmp("timestamp", ">=", self.start_date);
        clause.cmp("timestamp", "<=", self.end_date);
        clause.cmp("temperature", ">=", self.min_temp);
        clause.cmp("temperature", "<=", self.max_temp);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Case-insensitive substring over name, deviceId and location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl DeviceFilters {
    pub fn matches(&self, device: &Device) -> bool {
        let search = self.search.as_ref().map_or(true, |term| {
            let term = term.to_lowercase();
            [&device.name, &device.device_id, &device.location]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
        });

        self.status.map_or(true, |s| s == device.status)
            && self.location.as_ref().map_or(true, |l| *l == device.location)
            && search
    }

    pub fn push_where<'args>(&self, qb: &mut QueryBuilder<'args, Postgres>) {
        let mut clause = WhereClause::new(qb);
        clause.cmp("status", "=", self.status);
        clause.cmp("location", "=", self.location.clone());

        if let Some(term) = &self.search {
            let pattern = like_pattern(term);
            let qb = clause.next();
            qb.push("(\"name\" ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR \"deviceId\" ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR \"location\" ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn reading(temperature: f64, minutes: i64) -> Reading {
        Reading {
            id: format!("r{}", minutes),
            device_id: "clx1".to_string(),
            temperature,
            battery: None,
            status: ReadingStatus::classify(temperature, 2.0, 8.0),
            timestamp: t0() + Duration::minutes(minutes),
        }
    }

    fn alert(resolved: bool) -> Alert {
        Alert {
            id: "a1".to_string(),
            device_id: "clx1".to_string(),
            reading_id: Some("r1".to_string()),
            alert_type: AlertType::TemperatureHigh,
            severity: AlertSeverity::High,
            message: "Temperature above 8.0°C".to_string(),
            temperature: Some(9.5),
            threshold: Some(8.0),
            resolved,
            resolved_at: None,
            created_at: t0(),
        }
    }

    fn device(name: &str, location: &str) -> Device {
        Device {
            id: "clx1".to_string(),
            device_id: "CT-001".to_string(),
            name: name.to_string(),
            location: location.to_string(),
            latitude: None,
            longitude: None,
            status: DeviceStatus::Active,
            battery: None,
            min_temp: 2.0,
            max_temp: 8.0,
            last_seen: None,
            created_at: t0(),
            updated_at: t0(),
        }
    }

    fn select(table: &str) -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!("SELECT * FROM \"{}\"", table))
    }

    #[test]
    fn test_empty_filters_match_everything() {
        assert!(ReadingFilters::default().matches(&reading(40.0, 0)));
        assert!(AlertFilters::default().matches(&alert(true)));
        assert!(DeviceFilters::default().matches(&device("x", "y")));
    }

    #[test]
    fn test_reading_filters_and_semantics() {
        let filters = ReadingFilters {
            min_temp: Some(3.0),
            max_temp: Some(6.0),
            end_date: Some(t0() + Duration::minutes(30)),
            ..Default::default()
        };

        assert!(filters.matches(&reading(4.0, 30)));
        assert!(!filters.matches(&reading(4.0, 31)));
        assert!(!filters.matches(&reading(7.0, 0)));
    }

    #[test]
    fn test_alert_filters() {
        let filters = AlertFilters {
            resolved: Some(false),
            severity: Some(AlertSeverity::High),
            ..Default::default()
        };

        assert!(filters.matches(&alert(false)));
        assert!(!filters.matches(&alert(true)));
    }

    #[test]
    fn test_device_search_is_case_insensitive() {
        let filters = DeviceFilters {
            search: Some("pharm".to_string()),
            ..Default::default()
        };

        assert!(filters.matches(&device("Fridge", "Central PHARMACY")));
        assert!(!filters.matches(&device("Fridge", "Ward 3")));
    }

    #[test]
    fn test_empty_filter_renders_no_where() {
        let mut qb = select("Reading");
        ReadingFilters::default().push_where(&mut qb);
        assert_eq!(qb.sql(), "SELECT * FROM \"Reading\"");
    }

    #[test]
    fn test_reading_filter_sql_binds_each_field() {
        let mut qb = select("Reading");
        ReadingFilters {
            device_id: Some("clx1".to_string()),
            start_date: Some(t0()),
            min_temp: Some(2.0),
            ..Default::default()
        }
        .push_where(&mut qb);

        assert_eq!(
            qb.sql(),
            "SELECT * FROM \"Reading\" WHERE \"deviceId\" = $1 AND \"timestamp\" >= $2 AND \"temperature\" >= $3"
        );
    }

    #[test]
    fn test_alert_filter_sql() {
        let mut qb = select("Alert");
        AlertFilters {
            alert_type: Some(AlertType::BatteryLow),
            resolved: Some(false),
            ..Default::default()
        }
        .push_where(&mut qb);

        assert_eq!(
            qb.sql(),
            "SELECT * FROM \"Alert\" WHERE \"type\" = $1 AND \"resolved\" = $2"
        );
    }

    #[test]
    fn test_device_search_sql() {
        let mut qb = select("Device");
        DeviceFilters {
            status: Some(DeviceStatus::Offline),
            search: Some("50%_off".to_string()),
            ..Default::default()
        }
        .push_where(&mut qb);

        assert_eq!(
            qb.sql(),
            "SELECT * FROM \"Device\" WHERE \"status\" = $1 AND (\"name\" ILIKE $2 OR \"deviceId\" ILIKE $3 OR \"location\" ILIKE $4)"
        );
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_filters_from_query_json() {
        let filters: AlertFilters = serde_json::from_str(
            r#"{"deviceId":"clx1","type":"DEVICE_OFFLINE","startDate":"2024-06-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(filters.alert_type, Some(AlertType::DeviceOffline));
        assert_eq!(filters.start_date, Some(t0()));
        assert!(filters.severity.is_none());
    }
}
