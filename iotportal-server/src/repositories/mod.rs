mod device_model;
mod device_model_command;
mod device_model_property;
mod device_tag;
mod edge_device_model;

pub use device_model::DeviceModelRepository;
pub use device_model_command::DeviceModelCommandRepository;
pub use device_model_property::DeviceModelPropertyRepository;
pub use device_tag::DeviceTagRepository;
pub use edge_device_model::EdgeDeviceModelRepository;
