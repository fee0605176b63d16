use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Largest accepted upload (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct MlConfig {
    pub service_url: String,
    pub timeout: Duration,
    pub predict_endpoint: String,
    pub health_endpoint: String,
    pub model_info_endpoint: String,
    /// Total attempts per call, never below one.
    pub retry_times: u32,
    pub retry_sleep: Duration,
}

impl MlConfig {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            timeout: Duration::from_secs(30),
            predict_endpoint: "/predict".to_string(),
            health_endpoint: "/health".to_string(),
            model_info_endpoint: "/model-info".to_string(),
            retry_times: 2,
            retry_sleep: Duration::from_millis(1000),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.service_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_url: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub storage_root: PathBuf,
    pub per_page: i64,
    pub ml: MlConfig,
}

impl Config {
    /// Reads configuration from the process environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut ml = MlConfig::new(
            std::env::var("ML_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string()),
        );
        ml.timeout = Duration::from_secs(parse_or("ML_SERVICE_TIMEOUT", 30)?);
        ml.retry_times = parse_or("ML_SERVICE_RETRY_TIMES", 2u32)?.max(1);
        ml.retry_sleep = Duration::from_millis(parse_or("ML_SERVICE_RETRY_SLEEP", 1000)?);

        Ok(Self {
            addr: parse_or("APP_ADDR", SocketAddr::from(([0, 0, 0, 0], 8081)))?,
            app_url: std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:8081".to_string()),
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_minutes: parse_or("ACCESS_TOKEN_MINUTES", 60)?,
            refresh_token_days: parse_or("REFRESH_TOKEN_DAYS", 30)?,
            storage_root: std::env::var("STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("storage/public")),
            per_page: parse_or("PREDICTIONS_PER_PAGE", 10i64)?.clamp(1, 100),
            ml,
        })
    }

    /// Base URL the public disk is served under.
    pub fn storage_url(&self) -> String {
        format!("{}/storage", self.app_url.trim_end_matches('/'))
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let ml = MlConfig::new("http://ml:8000/");
        assert_eq!(ml.endpoint(&ml.predict_endpoint), "http://ml:8000/predict");
        assert_eq!(ml.endpoint(&ml.model_info_endpoint), "http://ml:8000/model-info");
    }

    #[test]
    fn test_ml_defaults() {
        let ml = MlConfig::new("http://localhost:8000");
        assert_eq!(ml.timeout, Duration::from_secs(30));
        assert_eq!(ml.retry_times, 2);
        assert_eq!(ml.retry_sleep, Duration::from_millis(1000));
    }

    #[test]
    fn test_parse_or_rejects_garbage() {
        std::env::set_var("PLANTDOC_TEST_PARSE_OR", "not-a-number");
        let err = parse_or("PLANTDOC_TEST_PARSE_OR", 5u32).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PLANTDOC_TEST_PARSE_OR", .. }));
        std::env::remove_var("PLANTDOC_TEST_PARSE_OR");
    }

    #[test]
    fn test_parse_or_falls_back_when_unset() {
        assert_eq!(parse_or("PLANTDOC_TEST_UNSET_KEY", 42u64).unwrap(), 42);
    }
}
