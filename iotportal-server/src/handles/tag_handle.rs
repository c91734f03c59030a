use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router, middleware};
use iotportal_api::models::DeviceTag;

use crate::errors::ApiError;
use crate::middlewares::{TokenState, auth};
use crate::services::DeviceTagService;

#[derive(Clone)]
pub struct TagState {
    pub device_tag_service: Arc<DeviceTagService>,
}

pub fn tag_router(tag_state: TagState, token_state: TokenState) -> Router {
    Router::new()
        .route(
            "/api/settings/device-tags",
            get(get_device_tags).post(set_device_tags),
        )
        .route("/api/settings/device-tags/:tag_name", delete(delete_device_tag))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(tag_state)
}

#[utoipa::path(
    get,
    path = "/api/settings/device-tags",
    tag = "settings",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device tags retrieved successfully", body = Vec<DeviceTag>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_device_tags(State(state): State<TagState>) -> Result<Json<Vec<DeviceTag>>, ApiError> {
    Ok(Json(state.device_tag_service.get_tags().await?))
}

/// Replaces the whole tag list.
#[utoipa::path(
    post,
    path = "/api/settings/device-tags",
    tag = "settings",
    request_body = Vec<DeviceTag>,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device tags replaced", body = Vec<DeviceTag>),
        (status = 400, description = "Invalid or duplicated tag"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn set_device_tags(
    State(state): State<TagState>,
    Json(body): Json<Vec<DeviceTag>>,
) -> Result<Json<Vec<DeviceTag>>, ApiError> {
    Ok(Json(state.device_tag_service.set_tags(body).await?))
}

#[utoipa::path(
    delete,
    path = "/api/settings/device-tags/{tag_name}",
    tag = "settings",
    params(
        ("tag_name" = String, Path, description = "Tag name")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Device tag deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tag not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_device_tag(
    State(state): State<TagState>,
    Path(tag_name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.device_tag_service.delete_tag(&tag_name).await?;

    Ok(StatusCode::NO_CONTENT)
}
