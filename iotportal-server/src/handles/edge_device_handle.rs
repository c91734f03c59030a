use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use iotportal_api::models::*;

use crate::errors::{ApiError, EdgeError};
use crate::middlewares::{TokenState, auth};
use crate::services::{DeviceQuery, EdgeDeviceService};

#[derive(Clone)]
pub struct EdgeDeviceState {
    pub edge_device_service: Arc<EdgeDeviceService>,
}

pub fn edge_device_router(edge_state: EdgeDeviceState, token_state: TokenState) -> Router {
    Router::new()
        .route(
            "/api/edge/devices",
            get(get_edge_devices).post(create_edge_device),
        )
        .route(
            "/api/edge/devices/:device_id",
            get(get_edge_device)
                .put(update_edge_device)
                .delete(delete_edge_device),
        )
        .route(
            "/api/edge/devices/:device_id/:module_id/_restart",
            post(restart_module),
        )
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(edge_state)
}

#[utoipa::path(
    get,
    path = "/api/edge/devices",
    tag = "edge",
    params(
        ("searchText" = Option<String>, Query, description = "Prefix of the device id or name"),
        ("searchStatus" = Option<bool>, Query, description = "Enabled devices only, or disabled only"),
        ("searchState" = Option<bool>, Query, description = "Connected devices only, or disconnected only"),
        ("modelId" = Option<String>, Query, description = "Edge model ID"),
        ("pageSize" = Option<u32>, Query, description = "Page size, 1 to 100"),
        ("pageNumber" = Option<u32>, Query, description = "Zero based page index")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Edge devices retrieved successfully", body = PaginatedResult<EdgeDeviceListItem>),
        (status = 400, description = "Invalid query"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_edge_devices(
    State(state): State<EdgeDeviceState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PaginatedResult<EdgeDeviceListItem>>, ApiError> {
    let query = DeviceQuery::from_params(&params)?;

    Ok(Json(state.edge_device_service.get_devices(&query).await?))
}

#[utoipa::path(
    post,
    path = "/api/edge/devices",
    tag = "edge",
    request_body = EdgeDevice,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Edge device created successfully", body = EdgeDevice),
        (status = 400, description = "Invalid device or unknown edge model"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Device already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_edge_device(
    State(state): State<EdgeDeviceState>,
    Json(body): Json<EdgeDevice>,
) -> Result<Json<EdgeDevice>, ApiError> {
    Ok(Json(state.edge_device_service.create_device(body).await?))
}

#[utoipa::path(
    get,
    path = "/api/edge/devices/{device_id}",
    tag = "edge",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Edge device with its deployed modules", body = EdgeDevice),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Edge device not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_edge_device(
    State(state): State<EdgeDeviceState>,
    Path(device_id): Path<String>,
) -> Result<Json<EdgeDevice>, ApiError> {
    Ok(Json(state.edge_device_service.get_device(&device_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/edge/devices/{device_id}",
    tag = "edge",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    request_body = EdgeDevice,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Edge device updated successfully", body = EdgeDevice),
        (status = 400, description = "Invalid device or id mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Edge device not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_edge_device(
    State(state): State<EdgeDeviceState>,
    Path(device_id): Path<String>,
    Json(body): Json<EdgeDevice>,
) -> Result<Json<EdgeDevice>, ApiError> {
    if body.device_id != device_id {
        return Err(EdgeError::InvalidRequest("device id in path and body differ".into()).into());
    }

    Ok(Json(state.edge_device_service.update_device(body).await?))
}

#[utoipa::path(
    delete,
    path = "/api/edge/devices/{device_id}",
    tag = "edge",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Edge device deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Edge device not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_edge_device(
    State(state): State<EdgeDeviceState>,
    Path(device_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.edge_device_service.delete_device(&device_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/edge/devices/{device_id}/{module_id}/_restart",
    tag = "edge",
    params(
        ("device_id" = String, Path, description = "Device ID"),
        ("module_id" = String, Path, description = "Module name as deployed on the device")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Module restarted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Edge device or module not found"),
        (status = 502, description = "Edge agent reported a failure"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn restart_module(
    State(state): State<EdgeDeviceState>,
    Path((device_id, module_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .edge_device_service
        .restart_module(&device_id, &module_id)
        .await?;

    Ok(StatusCode::OK)
}
