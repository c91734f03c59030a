use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum DeviceTagError {
    #[error("Device tag {0} not found")]
    TagNotFound(String),

    #[error("Invalid device tag name {0}")]
    InvalidTagName(String),

    #[error("Device tag {0} is declared twice")]
    DuplicateTag(String),

    #[error("Device tag {0} has an empty label")]
    MissingLabel(String),
}

impl DeviceTagError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeviceTagError::TagNotFound(_) => StatusCode::NOT_FOUND,
            DeviceTagError::InvalidTagName(_) => StatusCode::BAD_REQUEST,
            DeviceTagError::DuplicateTag(_) => StatusCode::BAD_REQUEST,
            DeviceTagError::MissingLabel(_) => StatusCode::BAD_REQUEST,
        }
    }
}
