use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingProviderKind {
    Osrm,
    StraightLine,
}

impl FromStr for RoutingProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "osrm" => Ok(Self::Osrm),
            "straight_line" => Ok(Self::StraightLine),
            other => Err(format!("unknown routing provider {other}, expected osrm/straight_line")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub load_penalty_weight: f64,
    pub max_driver_load: u32,
    pub routing_provider: RoutingProviderKind,
    pub osrm_url: String,
    pub routing_timeout_ms: u64,
    pub average_speed_kmh: f64,
    pub eta_model_path: Option<String>,
    pub dispatch_interval_secs: u64,
    pub commit_retries: u32,
    pub event_buffer_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            load_penalty_weight: parse_or_default("LOAD_PENALTY_WEIGHT", 2.0)?,
            max_driver_load: parse_or_default("MAX_DRIVER_LOAD", 1)?,
            routing_provider: parse_or_default("ROUTING_PROVIDER", RoutingProviderKind::Osrm)?,
            osrm_url: env::var("OSRM_URL")
                .unwrap_or_else(|_| "http://router.project-osrm.org".to_string()),
            routing_timeout_ms: parse_or_default("ROUTING_TIMEOUT_MS", 5_000)?,
            average_speed_kmh: parse_or_default("AVERAGE_SPEED_KMH", 30.0)?,
            eta_model_path: env::var("ETA_MODEL_PATH").ok().filter(|p| !p.is_empty()),
            dispatch_interval_secs: parse_or_default("DISPATCH_INTERVAL_SECS", 0)?,
            commit_retries: parse_or_default("COMMIT_RETRIES", 1)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.max_driver_load == 0 {
            return Err(AppError::Internal("MAX_DRIVER_LOAD must be > 0".to_string()));
        }
        if !(self.load_penalty_weight.is_finite() && self.load_penalty_weight >= 0.0) {
            return Err(AppError::Internal(
                "LOAD_PENALTY_WEIGHT must be a non-negative number".to_string(),
            ));
        }
        if !(self.average_speed_kmh.is_finite() && self.average_speed_kmh > 0.0) {
            return Err(AppError::Internal("AVERAGE_SPEED_KMH must be > 0".to_string()));
        }
        if self.routing_timeout_ms == 0 {
            return Err(AppError::Internal("ROUTING_TIMEOUT_MS must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn routing_timeout(&self) -> Duration {
        Duration::from_millis(self.routing_timeout_ms)
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
