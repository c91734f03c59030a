use super::{
    ConcentratorError, DeviceError, DeviceModelError, DeviceTagError, EdgeError, ImportError,
    RegistryError,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),

    #[error("Device model error: {0}")]
    DeviceModelError(#[from] DeviceModelError),

    #[error("Device tag error: {0}")]
    DeviceTagError(#[from] DeviceTagError),

    #[error("Concentrator error: {0}")]
    ConcentratorError(#[from] ConcentratorError),

    #[error("Edge error: {0}")]
    EdgeError(#[from] EdgeError),

    #[error("Import error: {0}")]
    ImportError(#[from] ImportError),

    #[error("Registry error: {0}")]
    RegistryError(#[from] RegistryError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
