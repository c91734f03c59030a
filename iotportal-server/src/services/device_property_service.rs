use std::sync::Arc;

use async_trait::async_trait;
use iotportal_api::models::{DeviceProperty, DevicePropertyType, DevicePropertyValue};
use serde_json::{Map, Number, Value};

use crate::errors::{ApiError, DeviceError, RegistryError};
use crate::mappers::DevicePropertyMapper;
use crate::registry::{AwsIotClient, TwinRegistry, value_as_string};
use crate::repositories::DeviceModelPropertyRepository;

/// Desired and reported property documents of one device.
#[derive(Debug, Clone, Default)]
pub struct PropertySnapshot {
    pub model_id: String,
    pub desired: Map<String, Value>,
    pub reported: Map<String, Value>,
}

/// Where device property values live: twin properties or shadow state.
#[async_trait]
pub trait DevicePropertyStore: Send + Sync {
    async fn load(&self, device_id: &str) -> Result<Option<PropertySnapshot>, RegistryError>;

    /// Merges the values into the desired document; `Null` removes a property.
    async fn save_desired(
        &self,
        device_id: &str,
        values: Map<String, Value>,
    ) -> Result<(), RegistryError>;
}

pub struct TwinPropertyStore {
    registry: Arc<dyn TwinRegistry>,
}

impl TwinPropertyStore {
    pub fn new(registry: Arc<dyn TwinRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl DevicePropertyStore for TwinPropertyStore {
    async fn load(&self, device_id: &str) -> Result<Option<PropertySnapshot>, RegistryError> {
        Ok(self
            .registry
            .get_twin(device_id)
            .await?
            .map(|twin| PropertySnapshot {
                model_id: twin.tag_or_default("modelId"),
                desired: twin.properties.desired.clone(),
                reported: twin.properties.reported.clone(),
            }))
    }

    async fn save_desired(
        &self,
        device_id: &str,
        values: Map<String, Value>,
    ) -> Result<(), RegistryError> {
        let mut twin = self
            .registry
            .get_twin(device_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(device_id.to_string()))?;

        for (name, value) in values {
            twin.set_desired(&name, Some(value));
        }

        self.registry.update_twin(&twin).await?;

        Ok(())
    }
}

pub struct ShadowPropertyStore {
    client: Arc<AwsIotClient>,
}

impl ShadowPropertyStore {
    pub fn new(client: Arc<AwsIotClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DevicePropertyStore for ShadowPropertyStore {
    async fn load(&self, device_id: &str) -> Result<Option<PropertySnapshot>, RegistryError> {
        let Some(thing) = self.client.describe_thing(device_id).await? else {
            return Ok(None);
        };

        let shadow = self.client.get_shadow(device_id).await?.unwrap_or_default();

        Ok(Some(PropertySnapshot {
            model_id: thing.attributes.get("modelId").cloned().unwrap_or_default(),
            desired: shadow.state.desired,
            reported: shadow.state.reported,
        }))
    }

    async fn save_desired(
        &self,
        device_id: &str,
        values: Map<String, Value>,
    ) -> Result<(), RegistryError> {
        // Shadow updates merge; a null desired value deletes the key.
        self.client.update_shadow(device_id, &values).await?;

        Ok(())
    }
}

/// Parses a raw value into the JSON type of the property.
fn typed_value(property: &DeviceProperty, raw: &str) -> Result<Value, DeviceError> {
    let invalid = || DeviceError::InvalidPropertyValue {
        name: property.name.clone(),
        expected: property.property_type.to_string(),
    };

    if !property.property_type.accepts(raw) {
        return Err(invalid());
    }

    let value = match property.property_type {
        DevicePropertyType::Boolean => Value::Bool(raw.parse().map_err(|_| invalid())?),
        DevicePropertyType::Integer | DevicePropertyType::Long => {
            Value::from(raw.parse::<i64>().map_err(|_| invalid())?)
        }
        DevicePropertyType::Double | DevicePropertyType::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid)?,
        DevicePropertyType::String => Value::from(raw),
    };

    Ok(value)
}

/// Values of the model properties on a device.
pub struct DevicePropertyService {
    store: Arc<dyn DevicePropertyStore>,
    property_repository: Arc<DeviceModelPropertyRepository>,
}

impl DevicePropertyService {
    pub fn new(
        store: Arc<dyn DevicePropertyStore>,
        property_repository: Arc<DeviceModelPropertyRepository>,
    ) -> Self {
        Self {
            store,
            property_repository,
        }
    }

    async fn load(
        &self,
        device_id: &str,
    ) -> Result<(PropertySnapshot, Vec<DeviceProperty>), ApiError> {
        let snapshot = self
            .store
            .load(device_id)
            .await?
            .ok_or_else(|| DeviceError::DeviceNotFound(device_id.to_string()))?;

        let properties = self
            .property_repository
            .find_by_model_id(&snapshot.model_id)
            .await?
            .iter()
            .map(|entity| DevicePropertyMapper.create_device_property(entity))
            .collect();

        Ok((snapshot, properties))
    }

    pub async fn get_properties(
        &self,
        device_id: &str,
    ) -> Result<Vec<DevicePropertyValue>, ApiError> {
        let (snapshot, properties) = self.load(device_id).await?;

        Ok(properties
            .into_iter()
            .map(|property| {
                let source = if property.is_writable {
                    &snapshot.desired
                } else {
                    &snapshot.reported
                };

                DevicePropertyValue {
                    value: source.get(&property.name).and_then(value_as_string),
                    name: property.name,
                    display_name: property.display_name,
                    is_writable: property.is_writable,
                    order: property.order,
                    property_type: property.property_type,
                }
            })
            .collect())
    }

    pub async fn set_properties(
        &self,
        device_id: &str,
        values: Vec<DevicePropertyValue>,
    ) -> Result<Vec<DevicePropertyValue>, ApiError> {
        let (_, properties) = self.load(device_id).await?;

        let mut desired = Map::new();
        for value in &values {
            let property = properties
                .iter()
                .find(|p| p.name == value.name)
                .ok_or_else(|| {
                    DeviceError::InvalidRequest(format!("unknown property {}", value.name))
                })?;

            if !property.is_writable {
                return Err(DeviceError::ReadOnlyProperty(property.name.clone()).into());
            }

            let json = match value.value.as_deref() {
                Some(raw) => typed_value(property, raw)?,
                None => Value::Null,
            };
            desired.insert(property.name.clone(), json);
        }

        self.store.save_desired(device_id, desired).await?;

        tracing::info!(device_id = %device_id, count = values.len(), "device properties updated");

        self.get_properties(device_id).await
    }
}
