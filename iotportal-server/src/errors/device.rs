use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device {0} not found")]
    DeviceNotFound(String),

    #[error("Device {0} already exists")]
    DeviceAlreadyExists(String),

    #[error("Invalid device id {0}")]
    InvalidDeviceId(String),

    #[error("Device id in path and body differ")]
    IdMismatch,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Tag {0} is required")]
    MissingRequiredTag(String),

    #[error("Tag {0} is not searchable")]
    UnknownTagFilter(String),

    #[error("Unknown device model {0}")]
    UnknownModel(String),

    #[error("Property {name} expects a {expected} value")]
    InvalidPropertyValue { name: String, expected: String },

    #[error("Property {0} is not writable")]
    ReadOnlyProperty(String),

    #[error("Command {0} not found")]
    CommandNotFound(String),

    #[error("Command could not be delivered: {0}")]
    CommandFailed(String),

    #[error("Invalid attribute value for {0}")]
    InvalidAttribute(String),
}

impl DeviceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeviceError::DeviceNotFound(_) => StatusCode::NOT_FOUND,
            DeviceError::DeviceAlreadyExists(_) => StatusCode::CONFLICT,
            DeviceError::InvalidDeviceId(_) => StatusCode::BAD_REQUEST,
            DeviceError::IdMismatch => StatusCode::BAD_REQUEST,
            DeviceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DeviceError::MissingRequiredTag(_) => StatusCode::BAD_REQUEST,
            DeviceError::UnknownTagFilter(_) => StatusCode::BAD_REQUEST,
            DeviceError::UnknownModel(_) => StatusCode::BAD_REQUEST,
            DeviceError::InvalidPropertyValue { .. } => StatusCode::BAD_REQUEST,
            DeviceError::ReadOnlyProperty(_) => StatusCode::BAD_REQUEST,
            DeviceError::CommandNotFound(_) => StatusCode::NOT_FOUND,
            DeviceError::CommandFailed(_) => StatusCode::BAD_GATEWAY,
            DeviceError::InvalidAttribute(_) => StatusCode::BAD_REQUEST,
        }
    }
}
