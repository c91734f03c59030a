use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use iotportal_api::models::*;

use crate::errors::{ApiError, DeviceError};
use crate::middlewares::{TokenState, auth};
use crate::services::{DeviceQuery, DeviceService, LoRaWanCommandService};

#[derive(Clone)]
pub struct LoRaDeviceState {
    pub device_service: Arc<dyn DeviceService<LoRaDeviceDetails>>,
    pub command_service: Arc<LoRaWanCommandService>,
}

pub fn lorawan_device_router(device_state: LoRaDeviceState, token_state: TokenState) -> Router {
    Router::new()
        .route(
            "/api/lorawan/devices",
            get(get_lora_devices).post(create_lora_device),
        )
        .route(
            "/api/lorawan/devices/:device_id",
            get(get_lora_device)
                .put(update_lora_device)
                .delete(delete_lora_device),
        )
        .route(
            "/api/lorawan/devices/:device_id/_command/:command_id",
            post(execute_command),
        )
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(device_state)
}

#[utoipa::path(
    get,
    path = "/api/lorawan/devices",
    tag = "lorawan",
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
        (status = 200, description = "LoRaWAN devices retrieved successfully", body = PaginatedResult<DeviceListItem>),
        (status = 400, description = "Invalid query"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_lora_devices(
    State(state): State<LoRaDeviceState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PaginatedResult<DeviceListItem>>, ApiError> {
    let query = DeviceQuery::from_params(&params)?;

    Ok(Json(state.device_service.get_devices(&query).await?))
}

#[utoipa::path(
    post,
    path = "/api/lorawan/devices",
    tag = "lorawan",
    request_body = LoRaDeviceDetails,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "LoRaWAN device created successfully", body = LoRaDeviceDetails),
        (status = 400, description = "Invalid device, keys or model"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Device already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_lora_device(
    State(state): State<LoRaDeviceState>,
    Json(body): Json<LoRaDeviceDetails>,
) -> Result<Json<LoRaDeviceDetails>, ApiError> {
    Ok(Json(state.device_service.create_device(body).await?))
}

#[utoipa::path(
    get,
    path = "/api/lorawan/devices/{device_id}",
    tag = "lorawan",
    params(
        ("device_id" = String, Path, description = "Device EUI")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "LoRaWAN device retrieved successfully", body = LoRaDeviceDetails),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_lora_device(
    State(state): State<LoRaDeviceState>,
    Path(device_id): Path<String>,
) -> Result<Json<LoRaDeviceDetails>, ApiError> {
    Ok(Json(state.device_service.get_device(&device_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/lorawan/devices/{device_id}",
    tag = "lorawan",
    params(
        ("device_id" = String, Path, description = "Device EUI")
    ),
    request_body = LoRaDeviceDetails,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "LoRaWAN device updated successfully", body = LoRaDeviceDetails),
        (status = 400, description = "Invalid device or id mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_lora_device(
    State(state): State<LoRaDeviceState>,
    Path(device_id): Path<String>,
    Json(body): Json<LoRaDeviceDetails>,
) -> Result<Json<LoRaDeviceDetails>, ApiError> {
    if body.device.device_id != device_id {
        return Err(DeviceError::IdMismatch.into());
    }

    Ok(Json(state.device_service.update_device(body).await?))
}

#[utoipa::path(
    delete,
    path = "/api/lorawan/devices/{device_id}",
    tag = "lorawan",
    params(
        ("device_id" = String, Path, description = "Device EUI")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "LoRaWAN device deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_lora_device(
    State(state): State<LoRaDeviceState>,
    Path(device_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.device_service.delete_device(&device_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/lorawan/devices/{device_id}/_command/{command_id}",
    tag = "lorawan",
    params(
        ("device_id" = String, Path, description = "Device EUI"),
        ("command_id" = String, Path, description = "Command ID of the device model")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Command queued by the network server"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device or command not found"),
        (status = 502, description = "Network server rejected the command"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn execute_command(
    State(state): State<LoRaDeviceState>,
    Path((device_id, command_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .command_service
        .execute_command(&device_id, &command_id)
        .await?;

    Ok(StatusCode::OK)
}
