use std::path::Path;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::haversine_km;
use crate::models::driver::GeoPoint;

#[derive(Debug, Error)]
pub enum EtaModelError {
    #[error("failed to read eta model {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid eta model {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

pub trait EtaEstimator: Send + Sync {
    /// Predicted travel time in minutes, never negative.
    fn estimate_minutes(&self, origin: &GeoPoint, destination: &GeoPoint, at: DateTime<Utc>) -> f64;
}

/// Regression over great-circle distance, hour of day and day of week.
///
/// `minutes = intercept + distance_km * d + distance_km^2 * d2 + hour * h + weekday * w`
///
/// Hour and weekday are taken in local time (`utc_offset_hours`); weekday is
/// 0 for Monday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionEtaModel {
    pub intercept: f64,
    pub distance_km: f64,
    #[serde(default)]
    pub distance_km_squared: f64,
    pub hour: f64,
    pub weekday: f64,
    #[serde(default)]
    pub utc_offset_hours: i64,
}

impl Default for RegressionEtaModel {
    fn default() -> Self {
        Self {
            intercept: 3.5,
            distance_km: 2.4,
            distance_km_squared: 0.015,
            hour: 0.12,
            weekday: -0.08,
            utc_offset_hours: 8,
        }
    }
}

impl RegressionEtaModel {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EtaModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| EtaModelError::Io {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| EtaModelError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn predict(&self, distance_km: f64, hour: u32, weekday: u32) -> f64 {
        let raw = self.intercept
            + self.distance_km * distance_km
            + self.distance_km_squared * distance_km * distance_km
            + self.hour * hour as f64
            + self.weekday * weekday as f64;

        if raw.is_finite() { raw.max(0.0) } else { 0.0 }
    }
}

impl EtaEstimator for RegressionEtaModel {
    fn estimate_minutes(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
        at: DateTime<Utc>,
    ) -> f64 {
        let distance_km = haversine_km(origin, destination);
        let local = at + Duration::hours(self.utc_offset_hours);
        self.predict(
            distance_km,
            local.hour(),
            local.weekday().num_days_from_monday(),
        )
    }
}
