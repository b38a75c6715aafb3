use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::activity::ActivityLogEntry;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 1_000;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/activity_logs", get(list_activity))
}

#[derive(Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ActivityResponse {
    pub activity_logs: Vec<ActivityLogEntry>,
}

async fn list_activity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let activity_logs = state.store.recent_activity(limit).await?;
    Ok(Json(ActivityResponse { activity_logs }))
}
