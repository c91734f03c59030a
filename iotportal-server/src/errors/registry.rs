use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("{0} not found in the registry")]
    NotFound(String),

    #[error("{0} already exists in the registry")]
    AlreadyExists(String),

    #[error("{0} was modified concurrently")]
    PreconditionFailed(String),

    #[error("Registry rejected the request: {0}")]
    InvalidRequest(String),

    #[error("Registry returned {status}: {body}")]
    Unexpected { status: u16, body: String },

    #[error("Invalid registry configuration: {0}")]
    Configuration(String),

    #[error("Registry transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry storage error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid registry document: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::AlreadyExists(_) => StatusCode::CONFLICT,
            RegistryError::PreconditionFailed(_) => StatusCode::CONFLICT,
            RegistryError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a failed registry response onto the error variants.
    pub fn from_status(status: u16, resource: &str, body: String) -> Self {
        match status {
            400 => RegistryError::InvalidRequest(body),
            404 => RegistryError::NotFound(resource.to_string()),
            409 => RegistryError::AlreadyExists(resource.to_string()),
            412 => RegistryError::PreconditionFailed(resource.to_string()),
            _ => RegistryError::Unexpected { status, body },
        }
    }
}
