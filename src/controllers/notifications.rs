use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::{AppPath, AuthUser},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seating/notifications", get(get_notifications))
        .route("/seating/notifications/{id}/read", patch(mark_as_read))
}

// GET /api/seating/notifications - последние уведомления текущего пользователя
async fn get_notifications(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let notifications = state.seating.sink().inbox(user.user_id).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true, "notifications": notifications }))))
}

// PATCH /api/seating/notifications/{id}/read
async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    if !state.seating.sink().mark_read(id, user.user_id).await? {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}
