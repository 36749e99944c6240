use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_API_BASE_URL: &str = "https://api-server.krontiva.africa/api:uEBBwbSs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub http_timeout: Duration,
    pub state_path: PathBuf,
    pub location_interval: Duration,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") | Err(_) => LogFormat::Compact,
            Ok(other) => {
                return Err(AppError::Config(format!("invalid LOG_FORMAT: {other}")));
            }
        };

        let api_base_url = env::var("RIDER_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if api_base_url.is_empty() {
            return Err(AppError::Config("RIDER_API_BASE_URL is empty".to_string()));
        }

        Ok(Self {
            api_base_url,
            http_timeout: Duration::from_secs(parse_or_default("RIDER_HTTP_TIMEOUT_SECS", 20)?),
            state_path: env::var("RIDER_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".rider/session.json")),
            location_interval: Duration::from_secs(parse_or_default(
                "RIDER_LOCATION_INTERVAL_SECS",
                30,
            )?),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format,
        })
    }

    /// Config pointing at an arbitrary backend, used by tests and embedders.
    pub fn for_base_url(api_base_url: impl Into<String>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            http_timeout: Duration::from_secs(20),
            state_path: state_path.into(),
            location_interval: Duration::from_secs(30),
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Config(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
