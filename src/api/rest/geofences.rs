use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::activity::ActivityKind;
use crate::models::driver::GeoPoint;
use crate::models::geofence::Geofence;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/geofences", post(create_geofence).get(list_geofences))
        .route("/geofences/check", post(check_geofence))
        .route("/geofences/:id", delete(delete_geofence))
}

#[derive(Deserialize)]
pub struct CreateGeofenceRequest {
    pub name: String,
    pub boundary: Vec<GeoPoint>,
}

#[derive(Deserialize)]
pub struct CheckGeofenceRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Serialize)]
pub struct CheckGeofenceResponse {
    pub coordinates: GeoPoint,
    pub inside_geofence: bool,
    pub geofence_name: Option<String>,
}

async fn create_geofence(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateGeofenceRequest>,
) -> Result<Json<Geofence>, AppError> {
    let geofence = Geofence::new(payload.name, payload.boundary)?;
    let geofence = state.store.insert_geofence(geofence).await?;

    state
        .record_activity(
            ActivityKind::AddGeofence,
            format!(
                "Added geofence '{}' with {} points",
                geofence.name,
                geofence.boundary.len()
            ),
        )
        .await;

    Ok(Json(geofence))
}

async fn list_geofences(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Geofence>>, AppError> {
    Ok(Json(state.store.list_geofences().await?))
}

async fn delete_geofence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Geofence>, AppError> {
    let geofence = state.store.delete_geofence(id).await?;

    state
        .record_activity(
            ActivityKind::DeleteGeofence,
            format!("Deleted geofence '{}' (ID: {id})", geofence.name),
        )
        .await;

    Ok(Json(geofence))
}

async fn check_geofence(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckGeofenceRequest>,
) -> Result<Json<CheckGeofenceResponse>, AppError> {
    let point = GeoPoint::new(payload.lat, payload.lng);
    if !point.is_valid() {
        return Err(AppError::BadRequest("lat/lng out of range".to_string()));
    }

    let geofence_name = state.engine.check_geofence(&point).await?;

    Ok(Json(CheckGeofenceResponse {
        coordinates: point,
        inside_geofence: geofence_name.is_some(),
        geofence_name,
    }))
}
