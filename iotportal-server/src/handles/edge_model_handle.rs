use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router, middleware};
use iotportal_api::models::*;

use crate::errors::{ApiError, EdgeError};
use crate::middlewares::{TokenState, auth};
use crate::services::EdgeModelService;

#[derive(Clone)]
pub struct EdgeModelState {
    pub edge_model_service: Arc<EdgeModelService>,
}

pub fn edge_model_router(model_state: EdgeModelState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/edge/models", get(get_edge_models).post(create_edge_model))
        .route(
            "/api/edge/models/:model_id",
            get(get_edge_model)
                .put(update_edge_model)
                .delete(delete_edge_model),
        )
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(model_state)
}

#[utoipa::path(
    get,
    path = "/api/edge/models",
    tag = "edge",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Edge models retrieved successfully", body = Vec<EdgeModelListItem>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_edge_models(
    State(state): State<EdgeModelState>,
) -> Result<Json<Vec<EdgeModelListItem>>, ApiError> {
    Ok(Json(state.edge_model_service.get_models().await?))
}

#[utoipa::path(
    post,
    path = "/api/edge/models",
    tag = "edge",
    request_body = EdgeModel,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Edge model created and its deployment published", body = EdgeModel),
        (status = 400, description = "Invalid model or module"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Edge model already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_edge_model(
    State(state): State<EdgeModelState>,
    Json(body): Json<EdgeModel>,
) -> Result<Json<EdgeModel>, ApiError> {
    Ok(Json(state.edge_model_service.create_model(body).await?))
}

#[utoipa::path(
    get,
    path = "/api/edge/models/{model_id}",
    tag = "edge",
    params(
        ("model_id" = String, Path, description = "Edge model ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Edge model with its modules", body = EdgeModel),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Edge model not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_edge_model(
    State(state): State<EdgeModelState>,
    Path(model_id): Path<String>,
) -> Result<Json<EdgeModel>, ApiError> {
    Ok(Json(state.edge_model_service.get_model(&model_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/edge/models/{model_id}",
    tag = "edge",
    params(
        ("model_id" = String, Path, description = "Edge model ID")
    ),
    request_body = EdgeModel,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Edge model updated and its deployment republished", body = EdgeModel),
        (status = 400, description = "Invalid model or id mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Edge model not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_edge_model(
    State(state): State<EdgeModelState>,
    Path(model_id): Path<String>,
    Json(body): Json<EdgeModel>,
) -> Result<Json<EdgeModel>, ApiError> {
    if body.model_id != model_id {
        return Err(EdgeError::InvalidRequest("model id in path and body differ".into()).into());
    }

    Ok(Json(state.edge_model_service.update_model(body).await?))
}

#[utoipa::path(
    delete,
    path = "/api/edge/models/{model_id}",
    tag = "edge",
    params(
        ("model_id" = String, Path, description = "Edge model ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Edge model and deployment deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Edge model not found"),
        (status = 409, description = "Edge model still used by devices"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_edge_model(
    State(state): State<EdgeModelState>,
    Path(model_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.edge_model_service.delete_model(&model_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
