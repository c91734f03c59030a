use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    #[error("Edge device {0} not found")]
    EdgeDeviceNotFound(String),

    #[error("Edge device {0} already exists")]
    EdgeDeviceAlreadyExists(String),

    #[error("Edge model {0} not found")]
    EdgeModelNotFound(String),

    #[error("Edge model {0} already exists")]
    EdgeModelAlreadyExists(String),

    #[error("Edge model {0} is used by at least one device")]
    EdgeModelInUse(String),

    #[error("Module {0} not found")]
    ModuleNotFound(String),

    #[error("Direct method failed with status {0}")]
    MethodFailed(i32),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl EdgeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EdgeError::EdgeDeviceNotFound(_) => StatusCode::NOT_FOUND,
            EdgeError::EdgeDeviceAlreadyExists(_) => StatusCode::CONFLICT,
            EdgeError::EdgeModelNotFound(_) => StatusCode::NOT_FOUND,
            EdgeError::EdgeModelAlreadyExists(_) => StatusCode::CONFLICT,
            EdgeError::EdgeModelInUse(_) => StatusCode::CONFLICT,
            EdgeError::ModuleNotFound(_) => StatusCode::NOT_FOUND,
            EdgeError::MethodFailed(_) => StatusCode::BAD_GATEWAY,
            EdgeError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}
