use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::driver::GeoPoint;

#[derive(Debug, Error, PartialEq)]
pub enum GeofenceError {
    #[error("geofence {name} needs at least 3 distinct vertices, got {count}")]
    TooFewVertices { name: String, count: usize },

    #[error("geofence {name} has an invalid vertex at index {index}")]
    InvalidVertex { name: String, index: usize },

    #[error("geofence name cannot be empty")]
    EmptyName,
}

/// Exclusion zone. `boundary` is a closed ring: the first and last vertex
/// coincide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geofence {
    pub id: Uuid,
    pub name: String,
    pub boundary: Vec<GeoPoint>,
    pub created_at: DateTime<Utc>,
}

impl Geofence {
    /// Validates the vertex list and closes the ring if needed.
    pub fn new(name: String, mut boundary: Vec<GeoPoint>) -> Result<Self, GeofenceError> {
        if name.trim().is_empty() {
            return Err(GeofenceError::EmptyName);
        }

        if let (Some(first), Some(last)) = (boundary.first().copied(), boundary.last()) {
            if !first.approx_eq(last) {
                boundary.push(first);
            }
        }

        let geofence = Self {
            id: Uuid::new_v4(),
            name,
            boundary,
            created_at: Utc::now(),
        };
        geofence.validate()?;
        Ok(geofence)
    }

    pub fn validate(&self) -> Result<(), GeofenceError> {
        if let Some(index) = self.boundary.iter().position(|p| !p.is_valid()) {
            return Err(GeofenceError::InvalidVertex {
                name: self.name.clone(),
                index,
            });
        }

        let count = self.distinct_vertex_count();
        let closed = match (self.boundary.first(), self.boundary.last()) {
            (Some(first), Some(last)) => first.approx_eq(last),
            _ => false,
        };

        if count < 3 || !closed {
            return Err(GeofenceError::TooFewVertices {
                name: self.name.clone(),
                count,
            });
        }

        Ok(())
    }

    fn distinct_vertex_count(&self) -> usize {
        let mut distinct: Vec<&GeoPoint> = Vec::with_capacity(self.boundary.len());
        for vertex in &self.boundary {
            if !distinct.iter().any(|seen| seen.approx_eq(vertex)) {
                distinct.push(vertex);
            }
        }
        distinct.len()
    }
}
