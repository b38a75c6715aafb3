use async_trait::async_trait;

use crate::geo::haversine_km;
use crate::models::driver::GeoPoint;
use crate::models::route::RouteLeg;
use crate::routing::{RouteError, RoutingProvider};

/// Routes as the crow flies at a constant speed. Useful offline and as the
/// baseline in tests.
pub struct StraightLineRouteProvider {
    speed_kmh: f64,
}

impl StraightLineRouteProvider {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }
}

#[async_trait]
impl RoutingProvider for StraightLineRouteProvider {
    async fn compute_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteLeg, RouteError> {
        if !(origin.is_valid() && destination.is_valid()) {
            return Err(RouteError::NoRoute);
        }

        let distance_km = haversine_km(&origin, &destination);
        let duration_seconds = distance_km / self.speed_kmh * 3_600.0;

        Ok(RouteLeg {
            waypoints: vec![origin, destination],
            distance_meters: distance_km * 1_000.0,
            duration_seconds,
        })
    }
}
