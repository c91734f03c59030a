use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router, middleware};
use iotportal_api::models::*;

use crate::errors::{ApiError, ConcentratorError};
use crate::middlewares::{TokenState, auth};
use crate::services::{ConcentratorService, DeviceQuery};

#[derive(Clone)]
pub struct ConcentratorState {
    pub concentrator_service: Arc<ConcentratorService>,
}

pub fn concentrator_router(concentrator_state: ConcentratorState, token_state: TokenState) -> Router {
    Router::new()
        .route(
            "/api/lorawan/concentrators",
            get(get_concentrators).post(create_concentrator),
        )
        .route(
            "/api/lorawan/concentrators/:device_id",
            get(get_concentrator)
                .put(update_concentrator)
                .delete(delete_concentrator),
        )
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(concentrator_state)
}

#[utoipa::path(
    get,
    path = "/api/lorawan/concentrators",
    tag = "lorawan",
    params(
        ("searchText" = Option<String>, Query, description = "Prefix of the station EUI or name"),
        ("searchStatus" = Option<bool>, Query, description = "Enabled concentrators only, or disabled only"),
        ("searchState" = Option<bool>, Query, description = "Connected concentrators only, or disconnected only"),
        ("pageSize" = Option<u32>, Query, description = "Page size, 1 to 100"),
        ("pageNumber" = Option<u32>, Query, description = "Zero based page index")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Concentrators retrieved successfully", body = PaginatedResult<Concentrator>),
        (status = 400, description = "Invalid query"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_concentrators(
    State(state): State<ConcentratorState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PaginatedResult<Concentrator>>, ApiError> {
    let query = DeviceQuery::from_params(&params)?;

    Ok(Json(
        state.concentrator_service.get_concentrators(&query).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/lorawan/concentrators",
    tag = "lorawan",
    request_body = Concentrator,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Concentrator created successfully", body = Concentrator),
        (status = 400, description = "Invalid station EUI or unknown region"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Concentrator already exists"),
        (status = 502, description = "Router configuration unavailable"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_concentrator(
    State(state): State<ConcentratorState>,
    Json(body): Json<Concentrator>,
) -> Result<Json<Concentrator>, ApiError> {
    Ok(Json(
        state.concentrator_service.create_concentrator(body).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/lorawan/concentrators/{device_id}",
    tag = "lorawan",
    params(
        ("device_id" = String, Path, description = "Station EUI")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Concentrator retrieved successfully", body = Concentrator),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Concentrator not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_concentrator(
    State(state): State<ConcentratorState>,
    Path(device_id): Path<String>,
) -> Result<Json<Concentrator>, ApiError> {
    Ok(Json(
        state.concentrator_service.get_concentrator(&device_id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/lorawan/concentrators/{device_id}",
    tag = "lorawan",
    params(
        ("device_id" = String, Path, description = "Station EUI")
    ),
    request_body = Concentrator,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Concentrator updated successfully", body = Concentrator),
        (status = 400, description = "Invalid concentrator or id mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Concentrator not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_concentrator(
    State(state): State<ConcentratorState>,
    Path(device_id): Path<String>,
    Json(body): Json<Concentrator>,
) -> Result<Json<Concentrator>, ApiError> {
    if body.device_id != device_id {
        return Err(ConcentratorError::InvalidRequest(
            "concentrator id in path and body differ".into(),
        )
        .into());
    }

    Ok(Json(
        state.concentrator_service.update_concentrator(body).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/lorawan/concentrators/{device_id}",
    tag = "lorawan",
    params(
        ("device_id" = String, Path, description = "Station EUI")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Concentrator deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Concentrator not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_concentrator(
    State(state): State<ConcentratorState>,
    Path(device_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .concentrator_service
        .delete_concentrator(&device_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
