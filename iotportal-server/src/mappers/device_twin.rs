use iotportal_api::models::{DeviceDetails, DeviceListItem, DeviceTag};

use super::TwinMapper;
use crate::registry::Twin;

pub(crate) const DEVICE_NAME_TAG: &str = "deviceName";
pub(crate) const MODEL_ID_TAG: &str = "modelId";
pub(crate) const DEVICE_TYPE_TAG: &str = "deviceType";
pub(crate) const SUPPORT_LORA_TAG: &str = "supportLoRaFeatures";

/// Standard devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceTwinMapper;

impl DeviceTwinMapper {
    pub(crate) fn read_details(twin: &Twin, tags: &[DeviceTag]) -> DeviceDetails {
        DeviceDetails {
            device_id: twin.device_id.clone(),
            device_name: twin.tag_or_default(DEVICE_NAME_TAG),
            model_id: twin.tag_or_default(MODEL_ID_TAG),
            image_url: None,
            is_connected: twin.is_connected(),
            is_enabled: twin.is_enabled(),
            status_updated_time: twin.status_update_time,
            last_activity_time: twin.last_activity_time,
            tags: tags
                .iter()
                .map(|tag| (tag.name.clone(), twin.tag_or_default(&tag.name)))
                .collect(),
        }
    }

    pub(crate) fn write_details(twin: &mut Twin, details: &DeviceDetails, tags: &[DeviceTag]) {
        twin.set_tag(DEVICE_NAME_TAG, details.device_name.as_str());
        twin.set_tag(MODEL_ID_TAG, details.model_id.as_str());

        for tag in tags {
            match details.tags.get(&tag.name).filter(|v| !v.is_empty()) {
                Some(value) => twin.set_tag(&tag.name, value.as_str()),
                None => twin.remove_tag(&tag.name),
            }
        }

        twin.set_enabled(details.is_enabled);
    }
}

impl TwinMapper for DeviceTwinMapper {
    type Details = DeviceDetails;

    fn create_device_details(&self, twin: &Twin, tags: &[DeviceTag]) -> DeviceDetails {
        Self::read_details(twin, tags)
    }

    fn create_device_list_item(&self, twin: &Twin) -> DeviceListItem {
        DeviceListItem {
            device_id: twin.device_id.clone(),
            device_name: twin.tag_or_default(DEVICE_NAME_TAG),
            model_id: twin.tag_or_default(MODEL_ID_TAG),
            image_url: None,
            is_connected: twin.is_connected(),
            is_enabled: twin.is_enabled(),
            status_updated_time: twin.status_update_time,
            last_activity_time: twin.last_activity_time,
            support_lora_features: twin
                .tag(SUPPORT_LORA_TAG)
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        }
    }

    fn update_twin(&self, twin: &mut Twin, details: &DeviceDetails, tags: &[DeviceTag]) {
        Self::write_details(twin, details, tags);
    }
}
