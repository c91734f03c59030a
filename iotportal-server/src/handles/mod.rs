mod admin_handle;
mod concentrator_handle;
mod dashboard_handle;
mod device_handle;
mod device_model_handle;
mod edge_device_handle;
mod edge_model_handle;
mod lorawan_device_handle;
mod lorawan_model_handle;
mod setting_handle;
mod tag_handle;

pub use admin_handle::*;
pub use concentrator_handle::*;
pub use dashboard_handle::*;
pub use device_handle::*;
pub use device_model_handle::*;
pub use edge_device_handle::*;
pub use edge_model_handle::*;
pub use lorawan_device_handle::*;
pub use lorawan_model_handle::*;
pub use setting_handle::*;
pub use tag_handle::*;
