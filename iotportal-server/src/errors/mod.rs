pub mod api;
pub mod concentrator;
pub mod device;
pub mod edge;
pub mod import;
pub mod model;
pub mod registry;
pub mod tag;

pub use api::ApiError;
pub use concentrator::ConcentratorError;
pub use device::DeviceError;
pub use edge::EdgeError;
pub use import::ImportError;
pub use model::DeviceModelError;
pub use registry::RegistryError;
pub use tag::DeviceTagError;

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use iotportal_api::models::ProblemDetails;
use uuid::Uuid;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::DeviceError(e) => e.status_code(),
            ApiError::DeviceModelError(e) => e.status_code(),
            ApiError::DeviceTagError(e) => e.status_code(),
            ApiError::ConcentratorError(e) => e.status_code(),
            ApiError::EdgeError(e) => e.status_code(),
            ApiError::ImportError(e) => e.status_code(),
            ApiError::RegistryError(e) => e.status_code(),
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the caller; internal failures stay in the logs.
    fn detail(&self) -> String {
        match self {
            ApiError::DeviceError(e) => e.to_string(),
            ApiError::DeviceModelError(e) => e.to_string(),
            ApiError::DeviceTagError(e) => e.to_string(),
            ApiError::ConcentratorError(e) => e.to_string(),
            ApiError::EdgeError(e) => e.to_string(),
            ApiError::ImportError(e) => e.to_string(),
            ApiError::RegistryError(e) => e.to_string(),
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_id = if status.is_server_error() {
            let error_id = Uuid::new_v4();
            tracing::error!(error_id = ?error_id, "{}", self);
            Some(error_id.to_string())
        } else {
            tracing::debug!("request rejected: {}", self);
            None
        };

        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.detail()
        };

        let body = ProblemDetails {
            problem_type: "about:blank".to_string(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            detail: Some(detail),
            error_id,
        };

        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(body),
        )
            .into_response()
    }
}
