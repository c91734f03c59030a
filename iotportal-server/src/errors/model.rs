use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum DeviceModelError {
    #[error("Device model {0} not found")]
    ModelNotFound(String),

    #[error("Device model {0} already exists")]
    ModelAlreadyExists(String),

    #[error("Device model {0} is used by at least one device")]
    ModelInUse(String),

    #[error("Device model {0} is built in and cannot be changed")]
    BuiltinModel(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid command {name}: {reason}")]
    InvalidCommand { name: String, reason: String },
}

impl DeviceModelError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeviceModelError::ModelNotFound(_) => StatusCode::NOT_FOUND,
            DeviceModelError::ModelAlreadyExists(_) => StatusCode::CONFLICT,
            DeviceModelError::ModelInUse(_) => StatusCode::CONFLICT,
            DeviceModelError::BuiltinModel(_) => StatusCode::BAD_REQUEST,
            DeviceModelError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DeviceModelError::InvalidCommand { .. } => StatusCode::BAD_REQUEST,
        }
    }
}
