use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::{AppJson, AppPath, AuthUser},
    models::{Role, SeatingDraft},
    services::seating::{DecideRequest, GenerateRequest},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seating/generate", post(generate_seating))
        .route("/seating", post(submit_seating))
        .route("/seating/pending", get(get_pending_plans))
        .route("/seating/history", get(get_faculty_plans))
        .route("/seating/my-plan", get(get_student_seating))
        .route("/seating/{id}/status", patch(update_seating_status))
        .route("/seating/{id}/notify", post(notify_students))
        .route("/seating/{id}", delete(delete_seating))
}

/* ---------- FACULTY ---------- */

// POST /api/seating/generate
async fn generate_seating(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(req): AppJson<GenerateRequest>,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[Role::Faculty, Role::Hod])?;

    let preview = state.seating.generate(&user, req).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true, "preview": preview }))))
}

// POST /api/seating
async fn submit_seating(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(draft): AppJson<SeatingDraft>,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[Role::Faculty, Role::Hod])?;

    let seating = state.seating.submit(&user, draft).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "seating": seating }))))
}

// GET /api/seating/history
async fn get_faculty_plans(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[Role::Faculty, Role::Hod])?;

    let plans = state.seating.history(&user).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true, "plans": plans }))))
}

// POST /api/seating/{id}/notify
async fn notify_students(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[Role::Faculty, Role::Hod])?;

    let outcome = state.seating.notify(id, &user).await?;
    let message = if outcome.recipients == 0 {
        "No students found in this section to notify".to_string()
    } else {
        format!("Notifications sent to {} students", outcome.recipients)
    };

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": message,
            "count": outcome.recipients,
            "dispatched": outcome.dispatched
        })),
    ))
}

// DELETE /api/seating/{id}
async fn delete_seating(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[Role::Faculty, Role::Hod])?;

    state.seating.delete(id, &user).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true, "message": "Seating plan deleted" }))))
}

/* ---------- HOD ---------- */

// GET /api/seating/pending
async fn get_pending_plans(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[Role::Hod])?;

    let plans = state.seating.pending_for(&user).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true, "plans": plans }))))
}

// PATCH /api/seating/{id}/status
async fn update_seating_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<DecideRequest>,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[Role::Hod])?;

    let seating = state
        .seating
        .decide(id, req.status, req.hod_remarks, &user)
        .await?;
    Ok((StatusCode::OK, Json(json!({ "success": true, "seating": seating }))))
}

/* ---------- STUDENT ---------- */

// GET /api/seating/my-plan
async fn get_student_seating(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    user.require_role(&[Role::Student])?;

    let seating = state.seating.my_seating(&user).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true, "seating": seating }))))
}
