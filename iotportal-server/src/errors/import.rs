use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Missing column {0}")]
    MissingHeader(String),

    #[error("Invalid CSV file: {0}")]
    InvalidCsv(String),
}

impl ImportError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ImportError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            ImportError::InvalidCsv(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        ImportError::InvalidCsv(value.to_string())
    }
}
