use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::GeoPoint;

/// One directed segment returned by a routing provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteLeg {
    pub waypoints: Vec<GeoPoint>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// Persisted driver -> pickup -> dropoff route of an assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub delivery_id: Uuid,
    pub waypoints: Vec<GeoPoint>,
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub created_at: DateTime<Utc>,
}

impl Route {
    /// Joins the two legs. The second leg usually starts where the first one
    /// ends; that junction point is kept once.
    pub fn compose(delivery_id: Uuid, to_pickup: &RouteLeg, to_dropoff: &RouteLeg) -> Self {
        let mut waypoints =
            Vec::with_capacity(to_pickup.waypoints.len() + to_dropoff.waypoints.len());
        waypoints.extend_from_slice(&to_pickup.waypoints);

        let skip = match (to_pickup.waypoints.last(), to_dropoff.waypoints.first()) {
            (Some(end), Some(start)) if end.approx_eq(start) => 1,
            _ => 0,
        };
        waypoints.extend(to_dropoff.waypoints.iter().skip(skip).copied());

        let distance_meters = to_pickup.distance_meters + to_dropoff.distance_meters;
        let duration_seconds = to_pickup.duration_seconds + to_dropoff.duration_seconds;

        Self {
            delivery_id,
            waypoints,
            distance_km: distance_meters / 1000.0,
            duration_minutes: duration_seconds / 60.0,
            created_at: Utc::now(),
        }
    }
}
