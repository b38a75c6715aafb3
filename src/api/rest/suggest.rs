use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::driver::GeoPoint;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/route/suggest", post(suggest_route))
}

#[derive(Deserialize)]
pub struct SuggestRouteRequest {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
}

#[derive(Serialize)]
pub struct SuggestRouteResponse {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub route_coordinates: Vec<GeoPoint>,
    pub distance_km: f64,
    pub estimated_time_route: f64,
    pub estimated_time_model: f64,
}

/// Provider route next to the model estimate for the same trip.
async fn suggest_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SuggestRouteRequest>,
) -> Result<Json<SuggestRouteResponse>, AppError> {
    if !(payload.origin.is_valid() && payload.destination.is_valid()) {
        return Err(AppError::BadRequest(
            "origin and destination must be valid lat/lng pairs".to_string(),
        ));
    }

    let timeout = state.engine.settings().routing_timeout;
    let leg = tokio::time::timeout(
        timeout,
        state
            .engine
            .router()
            .compute_route(payload.origin, payload.destination),
    )
    .await
    .map_err(|_| AppError::Internal("route calculation timed out".to_string()))?
    .map_err(|err| AppError::Internal(format!("route calculation failed: {err}")))?;

    let eta = state.engine.eta_estimator().await;
    let estimated_time_model =
        eta.estimate_minutes(&payload.origin, &payload.destination, Utc::now());

    Ok(Json(SuggestRouteResponse {
        origin: payload.origin,
        destination: payload.destination,
        distance_km: leg.distance_meters / 1000.0,
        estimated_time_route: leg.duration_seconds / 60.0,
        estimated_time_model,
        route_coordinates: leg.waypoints,
    }))
}
