use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use iotportal_api::models::ImportResultLine;

use crate::errors::ApiError;
use crate::middlewares::{TokenState, auth};
use crate::services::ExportService;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

#[derive(Clone)]
pub struct AdminState {
    pub export_service: Arc<ExportService>,
}

pub fn admin_router(admin_state: AdminState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/admin/devices/_export", get(export_devices))
        .route("/api/admin/devices/_template", get(export_template))
        .route("/api/admin/devices/_import", post(import_devices))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(admin_state)
}

fn csv_attachment(file_name: &str, content: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        content,
    )
}

#[utoipa::path(
    get,
    path = "/api/admin/devices/_export",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Every device as CSV", content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn export_devices(State(state): State<AdminState>) -> Result<impl IntoResponse, ApiError> {
    let content = state.export_service.export().await?;

    Ok(csv_attachment("devices.csv", content))
}

#[utoipa::path(
    get,
    path = "/api/admin/devices/_template",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Header row of the import file", content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn export_template(State(state): State<AdminState>) -> Result<impl IntoResponse, ApiError> {
    let content = state.export_service.template().await?;

    Ok(csv_attachment("template.csv", content))
}

#[utoipa::path(
    post,
    path = "/api/admin/devices/_import",
    tag = "admin",
    request_body(content = String, content_type = "text/csv", description = "Devices in the export format"),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "One line per rejected row", body = Vec<ImportResultLine>),
        (status = 400, description = "Missing mandatory column or unreadable file"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn import_devices(
    State(state): State<AdminState>,
    body: Bytes,
) -> Result<Json<Vec<ImportResultLine>>, ApiError> {
    Ok(Json(state.export_service.import(&body).await?))
}
