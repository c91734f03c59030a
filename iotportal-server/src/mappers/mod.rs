//! Translation between wire DTOs and registry or table representations.
//!
//! Mappers never perform I/O: services load twins, things and rows and hand
//! them over here.

mod aws_thing;
mod concentrator_twin;
mod device_model;
mod device_model_command;
mod device_property;
mod device_tag;
mod device_twin;
mod edge_device;
mod edge_model;
mod lora_device_twin;

use iotportal_api::models::{DeviceDetails, DeviceListItem, DeviceTag, LoRaDeviceDetails};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use aws_thing::AwsThingMapper;
pub use concentrator_twin::ConcentratorTwinMapper;
pub use device_model::DeviceModelMapper;
pub use device_model_command::DeviceModelCommandMapper;
pub use device_property::DevicePropertyMapper;
pub use device_tag::DeviceTagMapper;
pub use device_twin::DeviceTwinMapper;
pub use edge_device::EdgeDeviceMapper;
pub use edge_model::EdgeModelMapper;
pub use lora_device_twin::{LORA_DESIRED_PROPERTIES, LoRaDeviceTwinMapper};

use crate::registry::{Twin, value_as_string};

/// Access to the fields shared by every device details DTO.
pub trait AsDevice {
    fn device(&self) -> &DeviceDetails;

    fn device_mut(&mut self) -> &mut DeviceDetails;
}

impl AsDevice for DeviceDetails {
    fn device(&self) -> &DeviceDetails {
        self
    }

    fn device_mut(&mut self) -> &mut DeviceDetails {
        self
    }
}

impl AsDevice for LoRaDeviceDetails {
    fn device(&self) -> &DeviceDetails {
        &self.device
    }

    fn device_mut(&mut self) -> &mut DeviceDetails {
        &mut self.device
    }
}

pub trait TwinMapper: Send + Sync + 'static {
    type Details: AsDevice + Clone + Serialize + DeserializeOwned + Send + Sync + 'static;

    fn create_device_details(&self, twin: &Twin, tags: &[DeviceTag]) -> Self::Details;

    fn create_device_list_item(&self, twin: &Twin) -> DeviceListItem;

    /// Writes the details onto the twin, leaving reported state untouched.
    fn update_twin(&self, twin: &mut Twin, details: &Self::Details, tags: &[DeviceTag]);
}

/// Reads a boolean stored either as JSON boolean or as text.
pub(crate) fn as_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        other => value_as_string(other)?.to_ascii_lowercase().parse().ok(),
    }
}

/// Reads an integer stored either as JSON number or as text.
pub(crate) fn as_i32(value: Option<&Value>) -> Option<i32> {
    match value? {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        other => value_as_string(other)?.trim().parse().ok(),
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<Value> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(Value::from)
}
