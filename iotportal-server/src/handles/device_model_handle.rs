use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router, middleware};
use iotportal_api::models::*;

use crate::errors::{ApiError, DeviceModelError};
use crate::middlewares::{TokenState, auth};
use crate::services::DeviceModelService;

#[derive(Clone)]
pub struct DeviceModelState {
    pub device_model_service: Arc<DeviceModelService>,
}

pub fn device_model_router(model_state: DeviceModelState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/models", get(get_models).post(create_model))
        .route(
            "/api/models/:model_id",
            get(get_model).put(update_model).delete(delete_model),
        )
        .route(
            "/api/models/:model_id/properties",
            get(get_model_properties).post(set_model_properties),
        )
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(model_state)
}

#[utoipa::path(
    get,
    path = "/api/models",
    tag = "model",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device models retrieved successfully", body = Vec<DeviceModel>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_models(
    State(state): State<DeviceModelState>,
) -> Result<Json<Vec<DeviceModel>>, ApiError> {
    Ok(Json(state.device_model_service.get_models().await?))
}

#[utoipa::path(
    post,
    path = "/api/models",
    tag = "model",
    request_body = DeviceModel,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device model created successfully", body = DeviceModel),
        (status = 400, description = "Invalid model"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Model already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_model(
    State(state): State<DeviceModelState>,
    Json(body): Json<DeviceModel>,
) -> Result<Json<DeviceModel>, ApiError> {
    Ok(Json(state.device_model_service.create_model(body).await?))
}

#[utoipa::path(
    get,
    path = "/api/models/{model_id}",
    tag = "model",
    params(
        ("model_id" = String, Path, description = "Model ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device model retrieved successfully", body = DeviceModel),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Model not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_model(
    State(state): State<DeviceModelState>,
    Path(model_id): Path<String>,
) -> Result<Json<DeviceModel>, ApiError> {
    Ok(Json(state.device_model_service.get_model(&model_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/models/{model_id}",
    tag = "model",
    params(
        ("model_id" = String, Path, description = "Model ID")
    ),
    request_body = DeviceModel,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device model updated successfully", body = DeviceModel),
        (status = 400, description = "Invalid or built-in model"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Model not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_model(
    State(state): State<DeviceModelState>,
    Path(model_id): Path<String>,
    Json(body): Json<DeviceModel>,
) -> Result<Json<DeviceModel>, ApiError> {
    if body.model_id != model_id {
        return Err(DeviceModelError::InvalidRequest("model id in path and body differ".into()).into());
    }

    Ok(Json(state.device_model_service.update_model(body).await?))
}

#[utoipa::path(
    delete,
    path = "/api/models/{model_id}",
    tag = "model",
    params(
        ("model_id" = String, Path, description = "Model ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Device model deleted successfully"),
        (status = 400, description = "Built-in model"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Model not found"),
        (status = 409, description = "Model still used by devices"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_model(
    State(state): State<DeviceModelState>,
    Path(model_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.device_model_service.delete_model(&model_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/models/{model_id}/properties",
    tag = "model",
    params(
        ("model_id" = String, Path, description = "Model ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Model properties retrieved successfully", body = Vec<DeviceProperty>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Model not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_model_properties(
    State(state): State<DeviceModelState>,
    Path(model_id): Path<String>,
) -> Result<Json<Vec<DeviceProperty>>, ApiError> {
    Ok(Json(
        state.device_model_service.get_properties(&model_id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/models/{model_id}/properties",
    tag = "model",
    params(
        ("model_id" = String, Path, description = "Model ID")
    ),
    request_body = Vec<DeviceProperty>,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Model properties replaced", body = Vec<DeviceProperty>),
        (status = 400, description = "Invalid property list or built-in model"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Model not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn set_model_properties(
    State(state): State<DeviceModelState>,
    Path(model_id): Path<String>,
    Json(body): Json<Vec<DeviceProperty>>,
) -> Result<Json<Vec<DeviceProperty>>, ApiError> {
    Ok(Json(
        state
            .device_model_service
            .set_properties(&model_id, body)
            .await?,
    ))
}
