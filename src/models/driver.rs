use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Equality within a tolerance well below GPS precision.
    pub fn approx_eq(&self, other: &GeoPoint) -> bool {
        (self.lat - other.lat).abs() < 1e-9 && (self.lng - other.lng).abs() < 1e-9
    }
}

/// A driver's capacity is tracked by `current_load`; `available` mirrors
/// `current_load < max_load` and is only changed through [`Driver::reserve`]
/// and [`Driver::release`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub location: GeoPoint,
    pub current_load: u32,
    pub available: bool,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn new(name: String, location: GeoPoint) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            location,
            current_load: 0,
            available: true,
            updated_at: Utc::now(),
        }
    }

    /// Takes one unit of capacity. Returns false, leaving the driver untouched,
    /// when the driver is not available.
    pub fn reserve(&mut self, max_load: u32) -> bool {
        if !self.available || self.current_load >= max_load {
            return false;
        }

        self.current_load += 1;
        self.available = self.current_load < max_load;
        self.updated_at = Utc::now();
        true
    }

    pub fn release(&mut self, max_load: u32) {
        self.current_load = self.current_load.saturating_sub(1);
        self.available = self.current_load < max_load;
        self.updated_at = Utc::now();
    }
}
