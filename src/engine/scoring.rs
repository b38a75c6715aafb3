use std::cmp::Ordering;

use crate::geo::haversine_km;
use crate::models::driver::{Driver, GeoPoint};

/// Lower is better: kilometres to the pickup plus `load_penalty_weight`
/// kilometres for every delivery the driver already carries.
pub fn compute_score(driver: &Driver, pickup: &GeoPoint, load_penalty_weight: f64) -> f64 {
    let distance_km = haversine_km(&driver.location, pickup);
    distance_km + load_penalty_weight * driver.current_load as f64
}

/// Available drivers ordered best first. Equal scores fall back to the lower
/// driver id so the ranking is reproducible.
pub fn rank_candidates<'a>(
    drivers: &'a [Driver],
    pickup: &GeoPoint,
    load_penalty_weight: f64,
) -> Vec<(&'a Driver, f64)> {
    let mut ranked: Vec<(&Driver, f64)> = drivers
        .iter()
        .filter(|driver| driver.available)
        .map(|driver| (driver, compute_score(driver, pickup, load_penalty_weight)))
        .collect();

    ranked.sort_by(|a, b| match a.1.total_cmp(&b.1) {
        Ordering::Equal => a.0.id.cmp(&b.0.id),
        other => other,
    });
    ranked
}
