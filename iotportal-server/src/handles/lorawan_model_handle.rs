use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router, middleware};
use iotportal_api::models::*;

use crate::errors::{ApiError, DeviceModelError};
use crate::handles::DeviceModelState;
use crate::middlewares::{TokenState, auth};

pub fn lorawan_model_router(model_state: DeviceModelState, token_state: TokenState) -> Router {
    Router::new()
        .route(
            "/api/lorawan/models",
            get(get_lora_models).post(create_lora_model),
        )
        .route(
            "/api/lorawan/models/:model_id",
            get(get_lora_model)
                .put(update_lora_model)
                .delete(delete_lora_model),
        )
        .route(
            "/api/lorawan/models/:model_id/commands",
            get(get_model_commands).post(set_model_commands),
        )
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(model_state)
}

#[utoipa::path(
    get,
    path = "/api/lorawan/models",
    tag = "lorawan",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "LoRaWAN models retrieved successfully", body = Vec<LoRaDeviceModel>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_lora_models(
    State(state): State<DeviceModelState>,
) -> Result<Json<Vec<LoRaDeviceModel>>, ApiError> {
    Ok(Json(state.device_model_service.get_lora_models().await?))
}

#[utoipa::path(
    post,
    path = "/api/lorawan/models",
    tag = "lorawan",
    request_body = LoRaDeviceModel,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "LoRaWAN model created successfully", body = LoRaDeviceModel),
        (status = 400, description = "Invalid model"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Model already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_lora_model(
    State(state): State<DeviceModelState>,
    Json(body): Json<LoRaDeviceModel>,
) -> Result<Json<LoRaDeviceModel>, ApiError> {
    Ok(Json(
        state.device_model_service.create_lora_model(body).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/lorawan/models/{model_id}",
    tag = "lorawan",
    params(
        ("model_id" = String, Path, description = "Model ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "LoRaWAN model retrieved successfully", body = LoRaDeviceModel),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Model not found or not a LoRaWAN model"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_lora_model(
    State(state): State<DeviceModelState>,
    Path(model_id): Path<String>,
) -> Result<Json<LoRaDeviceModel>, ApiError> {
    Ok(Json(
        state.device_model_service.get_lora_model(&model_id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/lorawan/models/{model_id}",
    tag = "lorawan",
    params(
        ("model_id" = String, Path, description = "Model ID")
    ),
    request_body = LoRaDeviceModel,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "LoRaWAN model updated successfully", body = LoRaDeviceModel),
        (status = 400, description = "Invalid or built-in model"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Model not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_lora_model(
    State(state): State<DeviceModelState>,
    Path(model_id): Path<String>,
    Json(body): Json<LoRaDeviceModel>,
) -> Result<Json<LoRaDeviceModel>, ApiError> {
    if body.model.model_id != model_id {
        return Err(DeviceModelError::InvalidRequest("model id in path and body differ".into()).into());
    }

    Ok(Json(
        state.device_model_service.update_lora_model(body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/lorawan/models/{model_id}",
    tag = "lorawan",
    params(
        ("model_id" = String, Path, description = "Model ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "LoRaWAN model deleted successfully"),
        (status = 400, description = "Built-in model"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Model not found"),
        (status = 409, description = "Model still used by devices"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_lora_model(
    State(state): State<DeviceModelState>,
    Path(model_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .device_model_service
        .delete_lora_model(&model_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/lorawan/models/{model_id}/commands",
    tag = "lorawan",
    params(
        ("model_id" = String, Path, description = "Model ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Model commands retrieved successfully", body = Vec<DeviceModelCommand>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Model not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_model_commands(
    State(state): State<DeviceModelState>,
    Path(model_id): Path<String>,
) -> Result<Json<Vec<DeviceModelCommand>>, ApiError> {
    Ok(Json(
        state.device_model_service.get_commands(&model_id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/lorawan/models/{model_id}/commands",
    tag = "lorawan",
    params(
        ("model_id" = String, Path, description = "Model ID")
    ),
    request_body = Vec<DeviceModelCommand>,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Model commands replaced", body = Vec<DeviceModelCommand>),
        (status = 400, description = "Invalid command or built-in model"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Model not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn set_model_commands(
    State(state): State<DeviceModelState>,
    Path(model_id): Path<String>,
    Json(body): Json<Vec<DeviceModelCommand>>,
) -> Result<Json<Vec<DeviceModelCommand>>, ApiError> {
    Ok(Json(
        state
            .device_model_service
            .set_commands(&model_id, body)
            .await?,
    ))
}
