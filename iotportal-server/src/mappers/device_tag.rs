use iotportal_api::models::DeviceTag;

use crate::models::{DEFAULT_PARTITION_KEY, DeviceTagEntity};

#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceTagMapper;

impl DeviceTagMapper {
    pub fn create_device_tag(&self, entity: &DeviceTagEntity) -> DeviceTag {
        DeviceTag {
            name: entity.row_key.clone(),
            label: entity.label.clone(),
            required: entity.required,
            searchable: entity.searchable,
        }
    }

    pub fn create_table_entity(&self, tag: &DeviceTag) -> DeviceTagEntity {
        DeviceTagEntity {
            partition_key: DEFAULT_PARTITION_KEY.to_string(),
            row_key: tag.name.clone(),
            label: tag.label.clone(),
            required: tag.required,
            searchable: tag.searchable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        let tag = DeviceTag {
            name: "site".into(),
            label: "Site".into(),
            required: true,
            searchable: false,
        };

        let entity = DeviceTagMapper.create_table_entity(&tag);
        assert_eq!(entity.partition_key, DEFAULT_PARTITION_KEY);
        assert_eq!(DeviceTagMapper.create_device_tag(&entity), tag);
    }
}
