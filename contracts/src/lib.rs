//! Shared data contracts for the ColdTrace cold-chain monitoring dashboard.

pub mod analytics;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod filters;
pub mod input;
pub mod model;
pub mod pagination;
pub mod partial;
pub mod realtime;
pub mod stats;
pub mod validate;

pub use analytics::{DeviceAnalytics, TimeRange, TimeSeriesPoint};
pub use api::{ApiError, ApiErrorCode, ApiResponse, ValidationError};
pub use config::{env, is_development, is_production, is_test, validate_environment, AppEnv, Env};
pub use dashboard::{DashboardData, DeviceLocationData, LastReading};
pub use errors::{Error, Result};
pub use filters::{AlertFilters, DeviceFilters, ReadingFilters};
pub use input::{CreateAlertInput, CreateDeviceInput, CreateReadingInput, Patch, UpdateDeviceInput};
pub use model::{
    Alert, AlertSeverity, AlertType, AlertWithDevice, Device, DeviceStatus, DeviceWithAlertsAndReadings,
    DeviceWithReadings, Reading, ReadingStatus, ReadingWithDevice,
};
pub use pagination::{PaginatedResponse, Pagination, PaginationParams, SortOrder};
pub use partial::{apply_deep_partial, deep_merge};
pub use realtime::{RealtimeAlert, RealtimeEvent, RealtimeReading};
pub use stats::{DeviceStats, TemperatureStats};
