mod aws_device_service;
mod concentrator_service;
mod device_model_service;
mod device_property_service;
mod device_service;
mod device_tag_service;
mod edge_device_service;
mod edge_model_service;
mod export_service;
mod lorawan_command_service;
mod metrics_service;
mod token_service;
mod validation;

pub use aws_device_service::*;
pub use concentrator_service::*;
pub use device_model_service::*;
pub use device_property_service::*;
pub use device_service::*;
pub use device_tag_service::*;
pub use edge_device_service::*;
pub use edge_model_service::*;
pub use export_service::*;
pub use lorawan_command_service::*;
pub use metrics_service::*;
pub use token_service::*;
pub use validation::*;
