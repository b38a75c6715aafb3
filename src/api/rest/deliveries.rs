use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::activity::ActivityKind;
use crate::models::assignment::CycleReport;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::driver::GeoPoint;
use crate::models::route::Route;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/deliveries", post(create_delivery).get(list_deliveries))
        .route("/deliveries/assign", post(assign_deliveries))
        .route("/deliveries/:id", get(get_delivery))
        .route("/deliveries/:id/status", patch(update_delivery_status))
        .route("/routes/:delivery_id", get(get_route))
}

#[derive(Deserialize)]
pub struct CreateDeliveryRequest {
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
}

#[derive(Deserialize)]
pub struct UpdateDeliveryStatusRequest {
    pub status: DeliveryStatus,
}

async fn create_delivery(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDeliveryRequest>,
) -> Result<Json<Delivery>, AppError> {
    if !(payload.pickup.is_valid() && payload.dropoff.is_valid()) {
        return Err(AppError::BadRequest(
            "pickup and dropoff must be valid lat/lng pairs".to_string(),
        ));
    }

    let delivery = state
        .engine
        .queue()
        .enqueue(Delivery::new(payload.pickup, payload.dropoff))
        .await?;

    state
        .record_activity(
            ActivityKind::AddDelivery,
            format!(
                "Added delivery {} from {}, {} to {}, {}",
                delivery.id,
                delivery.pickup.lat,
                delivery.pickup.lng,
                delivery.dropoff.lat,
                delivery.dropoff.lng
            ),
        )
        .await;

    Ok(Json(delivery))
}

async fn list_deliveries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Delivery>>, AppError> {
    Ok(Json(state.store.list_deliveries().await?))
}

async fn get_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Delivery>, AppError> {
    Ok(Json(state.store.get_delivery(id).await?))
}

async fn update_delivery_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDeliveryStatusRequest>,
) -> Result<Json<Delivery>, AppError> {
    let delivery = state
        .engine
        .update_delivery_status(id, payload.status)
        .await?;

    state
        .record_activity(
            ActivityKind::UpdateDelivery,
            format!("Updated delivery {id} to status {:?}", delivery.status),
        )
        .await;

    Ok(Json(delivery))
}

async fn assign_deliveries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CycleReport>, AppError> {
    let report = state
        .engine
        .run_assignment_cycle()
        .await
        .map_err(|err| AppError::Internal(format!("dispatch cycle failed: {err}")))?;

    Ok(Json(report))
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(delivery_id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    Ok(Json(state.store.get_route(delivery_id).await?))
}
