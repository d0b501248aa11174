//! System settings endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::setting::SystemSetting};

/// Update setting payload
#[derive(Deserialize, ToSchema)]
pub struct UpdateSettingRequest {
    pub value: String,
    pub updated_by: Option<String>,
}

/// List all settings
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    responses(
        (status = 200, description = "All settings", body = Vec<SystemSetting>)
    )
)]
pub async fn list_settings(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<SystemSetting>>> {
    let settings = state.services.settings.list().await?;
    Ok(Json(settings))
}

/// Get a setting by key
#[utoipa::path(
    get,
    path = "/settings/{key}",
    tag = "settings",
    params(
        ("key" = String, Path, description = "Setting key")
    ),
    responses(
        (status = 200, description = "Setting value", body = SystemSetting),
        (status = 404, description = "Setting not set")
    )
)]
pub async fn get_setting(
    State(state): State<crate::AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<SystemSetting>> {
    let setting = state.services.settings.get(&key).await?;
    Ok(Json(setting))
}

/// Create or update a setting
#[utoipa::path(
    put,
    path = "/settings/{key}",
    tag = "settings",
    params(
        ("key" = String, Path, description = "Setting key")
    ),
    request_body = UpdateSettingRequest,
    responses(
        (status = 200, description = "Setting stored", body = SystemSetting),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn update_setting(
    State(state): State<crate::AppState>,
    Path(key): Path<String>,
    Json(request): Json<UpdateSettingRequest>,
) -> AppResult<Json<SystemSetting>> {
    let setting = state
        .services
        .settings
        .set(&key, &request.value, request.updated_by.as_deref())
        .await?;
    Ok(Json(setting))
}
