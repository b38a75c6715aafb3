use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    AddDriver,
    UpdateDriver,
    AddDelivery,
    UpdateDelivery,
    AddGeofence,
    DeleteGeofence,
    MalformedGeofence,
    GeofenceViolation,
    AssignmentFailed,
    RouteError,
    AssignmentConflict,
    AssignDriver,
    AssignedDelivery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub timestamp: DateTime<Utc>,
    pub activity_type: ActivityKind,
    pub details: String,
}

impl ActivityLogEntry {
    pub fn new(activity_type: ActivityKind, details: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            activity_type,
            details: details.into(),
        }
    }
}
