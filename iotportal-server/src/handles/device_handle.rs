use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router, middleware};
use iotportal_api::models::*;

use crate::errors::{ApiError, DeviceError};
use crate::middlewares::{TokenState, auth};
use crate::services::{DevicePropertyService, DeviceQuery, DeviceService};

#[derive(Clone)]
pub struct DeviceState {
    pub device_service: Arc<dyn DeviceService<DeviceDetails>>,
    pub device_property_service: Arc<DevicePropertyService>,
}

pub fn device_router(device_state: DeviceState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/devices", get(get_devices).post(create_device))
        .route(
            "/api/devices/:device_id",
            get(get_device).put(update_device).delete(delete_device),
        )
        .route(
            "/api/devices/:device_id/properties",
            get(get_device_properties).post(set_device_properties),
        )
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(device_state)
}

#[utoipa::path(
    get,
    path = "/api/devices",
    tag = "device",
    params(
        ("searchText" = Option<String>, Query, description = "Prefix of the device id or name"),
        ("searchStatus" = Option<bool>, Query, description = "Enabled devices only, or disabled only"),
        ("searchState" = Option<bool>, Query, description = "Connected devices only, or disconnected only"),
        ("modelId" = Option<String>, Query, description = "Device model ID"),
        ("pageSize" = Option<u32>, Query, description = "Page size, 1 to 100"),
        ("pageNumber" = Option<u32>, Query, description = "Zero based page index")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Devices retrieved successfully", body = PaginatedResult<DeviceListItem>),
        (status = 400, description = "Invalid query or non searchable tag filter"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_devices(
    State(state): State<DeviceState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PaginatedResult<DeviceListItem>>, ApiError> {
    let query = DeviceQuery::from_params(&params)?;

    Ok(Json(state.device_service.get_devices(&query).await?))
}

#[utoipa::path(
    post,
    path = "/api/devices",
    tag = "device",
    request_body = DeviceDetails,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device created successfully", body = DeviceDetails),
        (status = 400, description = "Invalid device or unknown model"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Device already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_device(
    State(state): State<DeviceState>,
    Json(body): Json<DeviceDetails>,
) -> Result<Json<DeviceDetails>, ApiError> {
    Ok(Json(state.device_service.create_device(body).await?))
}

#[utoipa::path(
    get,
    path = "/api/devices/{device_id}",
    tag = "device",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device retrieved successfully", body = DeviceDetails),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_device(
    State(state): State<DeviceState>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceDetails>, ApiError> {
    Ok(Json(state.device_service.get_device(&device_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/devices/{device_id}",
    tag = "device",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    request_body = DeviceDetails,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Device updated successfully", body = DeviceDetails),
        (status = 400, description = "Invalid device or id mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_device(
    State(state): State<DeviceState>,
    Path(device_id): Path<String>,
    Json(body): Json<DeviceDetails>,
) -> Result<Json<DeviceDetails>, ApiError> {
    if body.device_id != device_id {
        return Err(DeviceError::IdMismatch.into());
    }

    Ok(Json(state.device_service.update_device(body).await?))
}

#[utoipa::path(
    delete,
    path = "/api/devices/{device_id}",
    tag = "device",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Device deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_device(
    State(state): State<DeviceState>,
    Path(device_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.device_service.delete_device(&device_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/devices/{device_id}/properties",
    tag = "device",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Model property values of the device", body = Vec<DevicePropertyValue>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_device_properties(
    State(state): State<DeviceState>,
    Path(device_id): Path<String>,
) -> Result<Json<Vec<DevicePropertyValue>>, ApiError> {
    Ok(Json(
        state
            .device_property_service
            .get_properties(&device_id)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/devices/{device_id}/properties",
    tag = "device",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    request_body = Vec<DevicePropertyValue>,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Desired values written", body = Vec<DevicePropertyValue>),
        (status = 400, description = "Read-only property or badly typed value"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn set_device_properties(
    State(state): State<DeviceState>,
    Path(device_id): Path<String>,
    Json(body): Json<Vec<DevicePropertyValue>>,
) -> Result<Json<Vec<DevicePropertyValue>>, ApiError> {
    Ok(Json(
        state
            .device_property_service
            .set_properties(&device_id, body)
            .await?,
    ))
}
