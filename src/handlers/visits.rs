// src/handlers/visits.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        visit::{SaveVisitPayload, UpdateVisitPayload, Visit, VisitFilter},
        MessageResponse,
    },
};

// GET /api/visits
#[utoipa::path(
    get,
    path = "/api/visits",
    tag = "Visits",
    params(VisitFilter),
    responses(
        (status = 200, description = "Visit reports, newest first", body = Vec<Visit>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_visits(
    State(app_state): State<AppState>,
    Query(filter): Query<VisitFilter>,
) -> Result<impl IntoResponse, AppError> {
    let visits = app_state
        .visit_service
        .list(&app_state.db_pool, &filter)
        .await?;

    Ok((StatusCode::OK, Json(visits)))
}

// GET /api/visits/{id}
#[utoipa::path(
    get,
    path = "/api/visits/{id}",
    tag = "Visits",
    params(("id" = Uuid, Path, description = "Visit report ID")),
    responses(
        (status = 200, description = "Visit report", body = Visit),
        (status = 404, description = "Visit not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_visit(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let visit = app_state.visit_service.get(&app_state.db_pool, id).await?;
    Ok((StatusCode::OK, Json(visit)))
}

// POST /api/visits
#[utoipa::path(
    post,
    path = "/api/visits",
    tag = "Visits",
    request_body = SaveVisitPayload,
    responses(
        (status = 201, description = "Visit report saved", body = Visit),
        (status = 400, description = "Invalid or incomplete data"),
        (status = 404, description = "Customer not found"),
        (status = 422, description = "Pre-submission checklist incomplete")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_visit(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<SaveVisitPayload>,
) -> Result<impl IntoResponse, AppError> {
    let visit = app_state
        .visit_service
        .create(&app_state.db_pool, user.id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(visit)))
}

// PUT /api/visits/{id}
#[utoipa::path(
    put,
    path = "/api/visits/{id}",
    tag = "Visits",
    params(("id" = Uuid, Path, description = "Visit report ID")),
    request_body(
        content = SaveVisitPayload,
        description = "Only the fields sent are changed; `is_draft` defaults to the stored state"
    ),
    responses(
        (status = 200, description = "Visit report updated", body = Visit),
        (status = 400, description = "Invalid or incomplete data"),
        (status = 404, description = "Visit not found"),
        (status = 409, description = "Visit report already submitted"),
        (status = 422, description = "Pre-submission checklist incomplete")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_visit(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVisitPayload>,
) -> Result<impl IntoResponse, AppError> {
    let visit = app_state
        .visit_service
        .update(&app_state.db_pool, id, payload)
        .await?;

    Ok((StatusCode::OK, Json(visit)))
}

// DELETE /api/visits/{id}
#[utoipa::path(
    delete,
    path = "/api/visits/{id}",
    tag = "Visits",
    params(("id" = Uuid, Path, description = "Visit report ID")),
    responses(
        (status = 200, description = "Draft deleted", body = MessageResponse),
        (status = 404, description = "Visit not found"),
        (status = 409, description = "Visit report already submitted")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_visit(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.visit_service.delete(&app_state.db_pool, id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Visit deleted successfully"))))
}
