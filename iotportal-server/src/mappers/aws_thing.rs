use std::collections::BTreeMap;

use iotportal_api::models::{DeviceDetails, DeviceListItem, DeviceTag};

use super::device_twin::{DEVICE_NAME_TAG, MODEL_ID_TAG};
use crate::errors::DeviceError;
use crate::registry::aws::Thing;
use crate::registry::to_camel_case;

const MAX_ATTRIBUTE_LENGTH: usize = 800;

fn is_valid_attribute(value: &str) -> bool {
    value.len() <= MAX_ATTRIBUTE_LENGTH
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_.,@/:#-".contains(c))
}

/// Things carry names and tags as attributes; AWS has no connection state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsThingMapper;

impl AwsThingMapper {
    pub fn create_attributes(
        &self,
        details: &DeviceDetails,
        tags: &[DeviceTag],
    ) -> Result<BTreeMap<String, String>, DeviceError> {
        let mut attributes = BTreeMap::new();
        attributes.insert(DEVICE_NAME_TAG.to_string(), details.device_name.clone());
        attributes.insert(MODEL_ID_TAG.to_string(), details.model_id.clone());

        for tag in tags {
            if let Some(value) = details.tags.get(&tag.name).filter(|v| !v.is_empty()) {
                attributes.insert(to_camel_case(&tag.name), value.clone());
            }
        }

        if let Some((name, _)) = attributes.iter().find(|(_, v)| !is_valid_attribute(v)) {
            return Err(DeviceError::InvalidAttribute(name.clone()));
        }

        Ok(attributes)
    }

    pub fn create_device_details(&self, thing: &Thing, tags: &[DeviceTag]) -> DeviceDetails {
        let attribute = |name: &str| {
            thing
                .attributes
                .get(name)
                .or_else(|| thing.attributes.get(&to_camel_case(name)))
                .cloned()
                .unwrap_or_default()
        };

        DeviceDetails {
            device_id: thing.thing_name.clone(),
            device_name: attribute(DEVICE_NAME_TAG),
            model_id: attribute(MODEL_ID_TAG),
            image_url: None,
            is_connected: false,
            is_enabled: true,
            status_updated_time: None,
            last_activity_time: None,
            tags: tags
                .iter()
                .map(|tag| (tag.name.clone(), attribute(&tag.name)))
                .collect(),
        }
    }

    pub fn create_device_list_item(&self, thing: &Thing) -> DeviceListItem {
        DeviceListItem {
            device_id: thing.thing_name.clone(),
            device_name: thing.attributes.get(DEVICE_NAME_TAG).cloned().unwrap_or_default(),
            model_id: thing.attributes.get(MODEL_ID_TAG).cloned().unwrap_or_default(),
            image_url: None,
            is_connected: false,
            is_enabled: true,
            status_updated_time: None,
            last_activity_time: None,
            support_lora_features: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str) -> DeviceDetails {
        DeviceDetails {
            device_id: "dev-1".into(),
            device_name: name.into(),
            model_id: "m1".into(),
            tags: BTreeMap::from([("Site".to_string(), "paris".to_string())]),
            ..Default::default()
        }
    }

    fn tags() -> Vec<DeviceTag> {
        vec![DeviceTag {
            name: "Site".into(),
            label: "Site".into(),
            required: false,
            searchable: false,
        }]
    }

    #[test]
    fn test_attributes_round_trip() {
        let attributes = AwsThingMapper
            .create_attributes(&details("gauge-1"), &tags())
            .unwrap();
        assert_eq!(attributes["site"], "paris");

        let thing = Thing {
            thing_name: "dev-1".into(),
            attributes,
            ..Default::default()
        };
        let read = AwsThingMapper.create_device_details(&thing, &tags());

        assert_eq!(read.device_name, "gauge-1");
        assert_eq!(read.tags["Site"], "paris");
        assert!(read.is_enabled);
        assert!(!read.is_connected);
    }

    #[test]
    fn test_invalid_attribute_value_is_rejected() {
        let result = AwsThingMapper.create_attributes(&details("gauge 1"), &tags());

        assert!(matches!(result, Err(DeviceError::InvalidAttribute(name)) if name == "deviceName"));
        assert!(is_valid_attribute(&"a".repeat(800)));
        assert!(!is_valid_attribute(&"a".repeat(801)));
    }
}
