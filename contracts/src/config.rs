use crate::errors::{Error, Result};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    #[default]
    Development,
    Production,
    Test,
}

impl AppEnv {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(AppEnv::Development),
            "production" | "prod" => Some(AppEnv::Production),
            "test" => Some(AppEnv::Test),
            _ => None,
        }
    }
}

/// Validated process environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Env {
    pub database_url: String,
    pub app_env: AppEnv,
    pub port: u16,
    pub cors_origin: String,
    pub log_level: String,
}

impl Env {
    /// Validates an explicit set of variables, reporting every problem at once.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let mut problems = Vec::new();

        let database_url = match lookup(&vars, "DATABASE_URL") {
            Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {
                url.to_string()
            }
            Some(_) => {
                problems.push("DATABASE_URL must be a postgres:// or postgresql:// URL".to_string());
                String::new()
            }
            None => {
                problems.push("DATABASE_URL is required".to_string());
                String::new()
            }
        };

        let app_env = match lookup(&vars, "APP_ENV") {
            Some(value) => AppEnv::parse(value).unwrap_or_else(|| {
                problems.push(format!(
                    "APP_ENV '{}' is not one of development, production, test",
                    value
                ));
                AppEnv::default()
            }),
            None => AppEnv::default(),
        };

        let port = match lookup(&vars, "PORT") {
            Some(value) => value.parse::<u16>().unwrap_or_else(|_| {
                problems.push(format!("PORT '{}' is not a valid port number", value));
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let cors_origin = lookup(&vars, "CORS_ORIGIN")
            .unwrap_or(DEFAULT_CORS_ORIGIN)
            .to_string();

        let log_level = lookup(&vars, "LOG_LEVEL")
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_lowercase();
        if !LOG_LEVELS.contains(&log_level.as_str()) {
            problems.push(format!(
                "LOG_LEVEL '{}' is not one of {}",
                log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if !problems.is_empty() {
            return Err(Error::Config(problems.join("; ")));
        }

        Ok(Self {
            database_url,
            app_env,
            port,
            cors_origin,
            log_level,
        })
    }
}

fn lookup<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Loads `.env` if present and validates the process environment.
pub fn validate_environment() -> Result<Env> {
    dotenvy::dotenv().ok();
    let env = Env::from_vars(std::env::vars())?;
    info!(
        "Environment validated: {:?} on port {}",
        env.app_env, env.port
    );
    Ok(env)
}

lazy_static! {
    static ref ENV: std::result::Result<Env, String> =
        validate_environment().map_err(|e| match e {
            Error::Config(msg) => msg,
            other => other.to_string(),
        });
}

/// The process-wide environment, validated on first use.
pub fn env() -> Result<&'static Env> {
    (*ENV).as_ref().map_err(|msg| Error::Config(msg.clone()))
}

fn current_app_env() -> AppEnv {
    match env() {
        Ok(env) => env.app_env,
        Err(e) => {
            warn!("Falling back to APP_ENV lookup: {}", e);
            std::env::var("APP_ENV")
                .ok()
                .and_then(|v| AppEnv::parse(&v))
                .unwrap_or_default()
        }
    }
}

pub fn is_development() -> bool {
    current_app_env() == AppEnv::Development
}

pub fn is_production() -> bool {
    current_app_env() == AppEnv::Production
}

pub fn is_test() -> bool {
    current_app_env() == AppEnv::Test
}
