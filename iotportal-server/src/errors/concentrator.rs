use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ConcentratorError {
    #[error("Concentrator {0} not found")]
    ConcentratorNotFound(String),

    #[error("Concentrator {0} already exists")]
    ConcentratorAlreadyExists(String),

    #[error("Invalid station EUI {0}")]
    InvalidStationEui(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown LoRa region {0}")]
    UnknownRegion(String),

    #[error("Router configuration unavailable: {0}")]
    RouterConfigUnavailable(String),
}

impl ConcentratorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConcentratorError::ConcentratorNotFound(_) => StatusCode::NOT_FOUND,
            ConcentratorError::ConcentratorAlreadyExists(_) => StatusCode::CONFLICT,
            ConcentratorError::InvalidStationEui(_) => StatusCode::BAD_REQUEST,
            ConcentratorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ConcentratorError::UnknownRegion(_) => StatusCode::BAD_REQUEST,
            ConcentratorError::RouterConfigUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }
}
