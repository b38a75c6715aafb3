use geo::{Contains, LineString, Point, Polygon};
use tracing::warn;
use uuid::Uuid;

use crate::models::driver::GeoPoint;
use crate::models::geofence::{Geofence, GeofenceError};

struct Zone {
    name: String,
    polygon: Polygon<f64>,
}

/// Linear-scan point-in-polygon lookup over the registered exclusion zones.
/// Zone counts are expected in the tens; an R-tree becomes worthwhile only
/// well beyond that.
pub struct GeofenceIndex {
    zones: Vec<Zone>,
    skipped: Vec<(Uuid, GeofenceError)>,
}

impl GeofenceIndex {
    /// Builds the index, skipping malformed zones instead of failing.
    pub fn build<'a>(geofences: impl IntoIterator<Item = &'a Geofence>) -> Self {
        let mut zones = Vec::new();
        let mut skipped = Vec::new();

        for geofence in geofences {
            match geofence.validate() {
                Ok(()) => zones.push(Zone {
                    name: geofence.name.clone(),
                    polygon: to_polygon(&geofence.boundary),
                }),
                Err(err) => {
                    warn!(geofence_id = %geofence.id, error = %err, "skipping malformed geofence");
                    skipped.push((geofence.id, err));
                }
            }
        }

        Self { zones, skipped }
    }

    /// Name of the first zone that strictly contains `point`.
    pub fn is_excluded(&self, point: &GeoPoint) -> Option<&str> {
        let point = Point::new(point.lng, point.lat);
        self.zones
            .iter()
            .find(|zone| zone.polygon.contains(&point))
            .map(|zone| zone.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn skipped(&self) -> &[(Uuid, GeofenceError)] {
        &self.skipped
    }
}

fn to_polygon(boundary: &[GeoPoint]) -> Polygon<f64> {
    let exterior: LineString<f64> = boundary.iter().map(|p| (p.lng, p.lat)).collect();
    Polygon::new(exterior, vec![])
}
