use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::GeoPoint;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub delivery_id: Uuid,
    pub driver_id: Uuid,
    pub driver_name: String,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub eta_minutes: f64,
    pub model_eta_minutes: f64,
    pub distance_km: f64,
    pub route_coordinates: Vec<GeoPoint>,
}

/// Result of one delivery within a dispatch cycle. Every variant other than
/// `Assigned` leaves the delivery pending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Assigned(Assignment),
    SkippedGeofence { delivery_id: Uuid, zone: String },
    SkippedNoDriver { delivery_id: Uuid },
    SkippedRouteError { delivery_id: Uuid, reason: String },
    SkippedConflict { delivery_id: Uuid },
    Failed { delivery_id: Uuid, reason: String },
}

impl DispatchOutcome {
    pub fn delivery_id(&self) -> Uuid {
        match self {
            DispatchOutcome::Assigned(assignment) => assignment.delivery_id,
            DispatchOutcome::SkippedGeofence { delivery_id, .. }
            | DispatchOutcome::SkippedNoDriver { delivery_id }
            | DispatchOutcome::SkippedRouteError { delivery_id, .. }
            | DispatchOutcome::SkippedConflict { delivery_id }
            | DispatchOutcome::Failed { delivery_id, .. } => *delivery_id,
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Assigned(_) => "assigned",
            DispatchOutcome::SkippedGeofence { .. } => "skipped_geofence",
            DispatchOutcome::SkippedNoDriver { .. } => "skipped_no_driver",
            DispatchOutcome::SkippedRouteError { .. } => "skipped_route_error",
            DispatchOutcome::SkippedConflict { .. } => "skipped_conflict",
            DispatchOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, DispatchOutcome::Assigned(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub outcomes: Vec<DispatchOutcome>,
    pub total_assigned: usize,
}

impl CycleReport {
    pub fn new(outcomes: Vec<DispatchOutcome>) -> Self {
        let total_assigned = outcomes.iter().filter(|o| o.is_assigned()).count();
        Self {
            outcomes,
            total_assigned,
        }
    }
}
