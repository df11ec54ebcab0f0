// src/handlers/configurations.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{AdminOnly, RequireRole},
    models::{
        configuration::{
            Configuration, ConfigurationQuery, CreateConfigurationPayload,
            UpdateConfigurationPayload,
        },
        MessageResponse,
    },
};

// GET /api/config?type=visit_purposes
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "Configuration",
    params(ConfigurationQuery),
    responses(
        (status = 200, description = "Active lookup values", body = Vec<Configuration>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_configurations(
    State(app_state): State<AppState>,
    Query(query): Query<ConfigurationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state
        .configuration_service
        .list(&app_state.db_pool, query.config_type)
        .await?;

    Ok((StatusCode::OK, Json(items)))
}

// POST /api/config
#[utoipa::path(
    post,
    path = "/api/config",
    tag = "Configuration",
    request_body = CreateConfigurationPayload,
    responses(
        (status = 201, description = "Lookup value created", body = Configuration),
        (status = 400, description = "Invalid data"),
        (status = 403, description = "Administrators only")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_configuration(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateConfigurationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .configuration_service
        .create(&app_state.db_pool, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

// PUT /api/config/{id}
#[utoipa::path(
    put,
    path = "/api/config/{id}",
    tag = "Configuration",
    params(("id" = Uuid, Path, description = "Configuration ID")),
    request_body = UpdateConfigurationPayload,
    responses(
        (status = 200, description = "Lookup value updated", body = Configuration),
        (status = 403, description = "Administrators only"),
        (status = 404, description = "Configuration not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_configuration(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateConfigurationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .configuration_service
        .update(&app_state.db_pool, id, &payload)
        .await?;

    Ok((StatusCode::OK, Json(item)))
}

// DELETE /api/config/{id}
#[utoipa::path(
    delete,
    path = "/api/config/{id}",
    tag = "Configuration",
    params(("id" = Uuid, Path, description = "Configuration ID")),
    responses(
        (status = 200, description = "Lookup value deleted", body = MessageResponse),
        (status = 403, description = "Administrators only"),
        (status = 404, description = "Configuration not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_configuration(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .configuration_service
        .delete(&app_state.db_pool, id)
        .await?;

    Ok((StatusCode::OK, Json(MessageResponse::new("Configuration deleted successfully"))))
}
