use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::activity::ActivityKind;
use crate::models::driver::{Driver, GeoPoint};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id/location", patch(update_driver_location))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub location: GeoPoint,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

fn validate_location(location: &GeoPoint) -> Result<(), AppError> {
    if location.is_valid() {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "location must be a valid lat/lng pair".to_string(),
        ))
    }
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    validate_location(&payload.location)?;

    let driver = state
        .store
        .insert_driver(Driver::new(payload.name, payload.location))
        .await?;

    state
        .record_activity(
            ActivityKind::AddDriver,
            format!(
                "Added driver {} at {}, {}",
                driver.name, driver.location.lat, driver.location.lng
            ),
        )
        .await;

    Ok(Json(driver))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Driver>>, AppError> {
    Ok(Json(state.store.list_drivers().await?))
}

async fn update_driver_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Driver>, AppError> {
    validate_location(&payload.location)?;

    let driver = state
        .store
        .update_driver_location(id, payload.location)
        .await?;

    state
        .record_activity(
            ActivityKind::UpdateDriver,
            format!(
                "Updated driver {id} to {}, {}",
                driver.location.lat, driver.location.lng
            ),
        )
        .await;

    Ok(Json(driver))
}
