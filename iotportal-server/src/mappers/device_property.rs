use iotportal_api::models::{DeviceProperty, DevicePropertyType};

use crate::models::DeviceModelPropertyEntity;

#[derive(Debug, Clone, Copy, Default)]
pub struct DevicePropertyMapper;

impl DevicePropertyMapper {
    pub fn create_device_property(&self, entity: &DeviceModelPropertyEntity) -> DeviceProperty {
        DeviceProperty {
            name: entity.name.clone(),
            display_name: entity.display_name.clone(),
            is_writable: entity.is_writable,
            order: entity.position,
            property_type: entity
                .property_type
                .parse()
                .unwrap_or(DevicePropertyType::String),
        }
    }

    /// Property rows are keyed by model id and property name.
    pub fn create_table_entity(
        &self,
        model_id: &str,
        property: &DeviceProperty,
    ) -> DeviceModelPropertyEntity {
        DeviceModelPropertyEntity {
            partition_key: model_id.to_string(),
            row_key: property.name.clone(),
            name: property.name.clone(),
            display_name: property.display_name.clone(),
            is_writable: property.is_writable,
            position: property.order,
            property_type: property.property_type.to_string(),
        }
    }
}
