use std::collections::HashSet;
use std::sync::Arc;

use iotportal_api::models::{
    DeviceDetails, DeviceModel, DeviceModelCommand, DeviceProperty, LoRaDeviceModel,
};
use uuid::Uuid;

use super::device_service::{DeviceQuery, DeviceService};
use super::validation::decode_hex;
use crate::errors::{ApiError, DeviceModelError};
use crate::mappers::{DeviceModelCommandMapper, DeviceModelMapper, DevicePropertyMapper};
use crate::models::{DEFAULT_PARTITION_KEY, DeviceModelEntity};
use crate::repositories::{
    DeviceModelCommandRepository, DeviceModelPropertyRepository, DeviceModelRepository,
};

const MAX_FRAME_BYTES: usize = 255;

fn new_id(id: &str) -> String {
    if id.trim().is_empty() {
        Uuid::new_v4().to_string()
    } else {
        id.to_string()
    }
}

fn validate_command(command: &DeviceModelCommand) -> Result<(), DeviceModelError> {
    let invalid = |reason: &str| DeviceModelError::InvalidCommand {
        name: command.name.clone(),
        reason: reason.to_string(),
    };

    if command.name.trim().is_empty() {
        return Err(invalid("name is required"));
    }

    match decode_hex(&command.frame) {
        Some(bytes) if bytes.len() <= MAX_FRAME_BYTES => {}
        Some(_) => return Err(invalid("frame is longer than 255 bytes")),
        None => return Err(invalid("frame must be an even-length hexadecimal string")),
    }

    if !(1..=223).contains(&command.port) {
        return Err(invalid("port must be between 1 and 223"));
    }

    Ok(())
}

/// Standard and LoRaWAN device models with their properties and commands.
pub struct DeviceModelService {
    mapper: DeviceModelMapper,
    device_model_repository: Arc<DeviceModelRepository>,
    property_repository: Arc<DeviceModelPropertyRepository>,
    command_repository: Arc<DeviceModelCommandRepository>,
    devices: Arc<dyn DeviceService<DeviceDetails>>,
}

impl DeviceModelService {
    pub fn new(
        device_model_repository: Arc<DeviceModelRepository>,
        property_repository: Arc<DeviceModelPropertyRepository>,
        command_repository: Arc<DeviceModelCommandRepository>,
        devices: Arc<dyn DeviceService<DeviceDetails>>,
    ) -> Self {
        Self {
            mapper: DeviceModelMapper,
            device_model_repository,
            property_repository,
            command_repository,
            devices,
        }
    }

    async fn find(&self, model_id: &str) -> Result<DeviceModelEntity, ApiError> {
        Ok(self
            .device_model_repository
            .find_by_id(model_id)
            .await?
            .ok_or_else(|| DeviceModelError::ModelNotFound(model_id.to_string()))?)
    }

    async fn find_lora(&self, model_id: &str) -> Result<DeviceModelEntity, ApiError> {
        let entity = self.find(model_id).await?;
        if !entity.support_lorawan_features {
            return Err(DeviceModelError::ModelNotFound(model_id.to_string()).into());
        }

        Ok(entity)
    }

    async fn find_editable(&self, model_id: &str) -> Result<DeviceModelEntity, ApiError> {
        let entity = self.find(model_id).await?;
        if entity.is_builtin {
            return Err(DeviceModelError::BuiltinModel(model_id.to_string()).into());
        }

        Ok(entity)
    }

    async fn insert(&self, entity: &DeviceModelEntity) -> Result<(), ApiError> {
        if entity.name.trim().is_empty() {
            return Err(DeviceModelError::InvalidRequest("model name is required".into()).into());
        }

        if self
            .device_model_repository
            .find_by_id(&entity.row_key)
            .await?
            .is_some()
        {
            return Err(DeviceModelError::ModelAlreadyExists(entity.row_key.clone()).into());
        }

        let mut tx = self.device_model_repository.get_pool().begin().await?;
        self.device_model_repository.create(entity, &mut tx).await?;
        tx.commit().await?;

        tracing::info!(model_id = %entity.row_key, "device model created");

        Ok(())
    }

    async fn save(&self, entity: &DeviceModelEntity) -> Result<(), ApiError> {
        if entity.name.trim().is_empty() {
            return Err(DeviceModelError::InvalidRequest("model name is required".into()).into());
        }

        let mut tx = self.device_model_repository.get_pool().begin().await?;
        self.device_model_repository.update(entity, &mut tx).await?;
        tx.commit().await?;

        tracing::info!(model_id = %entity.row_key, "device model updated");

        Ok(())
    }

    pub async fn get_models(&self) -> Result<Vec<DeviceModel>, ApiError> {
        Ok(self
            .device_model_repository
            .find_all()
            .await?
            .iter()
            .map(|entity| self.mapper.create_device_model(entity))
            .collect())
    }

    pub async fn get_model(&self, model_id: &str) -> Result<DeviceModel, ApiError> {
        Ok(self.mapper.create_device_model(&self.find(model_id).await?))
    }

    pub async fn create_model(&self, mut model: DeviceModel) -> Result<DeviceModel, ApiError> {
        model.model_id = new_id(&model.model_id);

        let mut entity = DeviceModelEntity {
            is_builtin: model.is_builtin,
            ..Default::default()
        };
        self.mapper.update_table_entity(&mut entity, &model);
        if entity.support_lorawan_features {
            let defaults = LoRaDeviceModel::new(model.clone());
            self.mapper.update_lora_table_entity(&mut entity, &defaults);
        }

        self.insert(&entity).await?;

        Ok(self.mapper.create_device_model(&entity))
    }

    pub async fn update_model(&self, model: DeviceModel) -> Result<DeviceModel, ApiError> {
        let mut entity = self.find_editable(&model.model_id).await?;

        // LoRaWAN columns are only edited through the LoRaWAN model routes.
        let support_lorawan_features = entity.support_lorawan_features;
        self.mapper.update_table_entity(&mut entity, &model);
        entity.support_lorawan_features = support_lorawan_features;

        self.save(&entity).await?;

        Ok(self.mapper.create_device_model(&entity))
    }

    pub async fn delete_model(&self, model_id: &str) -> Result<(), ApiError> {
        self.find_editable(model_id).await?;

        let usage = self
            .devices
            .get_devices(&DeviceQuery {
                model_id: Some(model_id.to_string()),
                page_size: 1,
                ..Default::default()
            })
            .await?;
        if usage.total_items > 0 {
            return Err(DeviceModelError::ModelInUse(model_id.to_string()).into());
        }

        // Properties and commands cascade with the model row.
        let mut tx = self.device_model_repository.get_pool().begin().await?;
        self.device_model_repository.delete(model_id, &mut tx).await?;
        tx.commit().await?;

        tracing::info!(model_id = %model_id, "device model deleted");

        Ok(())
    }

    pub async fn get_properties(&self, model_id: &str) -> Result<Vec<DeviceProperty>, ApiError> {
        self.find(model_id).await?;

        Ok(self
            .property_repository
            .find_by_model_id(model_id)
            .await?
            .iter()
            .map(|entity| DevicePropertyMapper.create_device_property(entity))
            .collect())
    }

    pub async fn set_properties(
        &self,
        model_id: &str,
        properties: Vec<DeviceProperty>,
    ) -> Result<Vec<DeviceProperty>, ApiError> {
        self.find_editable(model_id).await?;

        let mut names = HashSet::new();
        for property in &properties {
            if property.name.trim().is_empty() || property.display_name.trim().is_empty() {
                return Err(DeviceModelError::InvalidRequest(
                    "property name and display name are required".into(),
                )
                .into());
            }
            if !names.insert(property.name.as_str()) {
                return Err(DeviceModelError::InvalidRequest(format!(
                    "property {} is declared twice",
                    property.name
                ))
                .into());
            }
        }

        let entities: Vec<_> = properties
            .iter()
            .map(|property| DevicePropertyMapper.create_table_entity(model_id, property))
            .collect();

        let mut tx = self.property_repository.get_pool().begin().await?;
        self.property_repository
            .save_all(model_id, &entities, &mut tx)
            .await?;
        tx.commit().await?;

        tracing::info!(model_id = %model_id, count = entities.len(), "model properties replaced");

        self.get_properties(model_id).await
    }

    pub async fn get_lora_models(&self) -> Result<Vec<LoRaDeviceModel>, ApiError> {
        Ok(self
            .device_model_repository
            .find_by_lorawan_support(true)
            .await?
            .iter()
            .map(|entity| self.mapper.create_lora_device_model(entity))
            .collect())
    }

    pub async fn get_lora_model(&self, model_id: &str) -> Result<LoRaDeviceModel, ApiError> {
        Ok(self
            .mapper
            .create_lora_device_model(&self.find_lora(model_id).await?))
    }

    pub async fn create_lora_model(
        &self,
        mut model: LoRaDeviceModel,
    ) -> Result<LoRaDeviceModel, ApiError> {
        model.model.model_id = new_id(&model.model.model_id);

        let mut entity = DeviceModelEntity {
            partition_key: DEFAULT_PARTITION_KEY.to_string(),
            is_builtin: model.model.is_builtin,
            ..Default::default()
        };
        self.mapper.update_lora_table_entity(&mut entity, &model);

        self.insert(&entity).await?;

        Ok(self.mapper.create_lora_device_model(&entity))
    }

    pub async fn update_lora_model(
        &self,
        model: LoRaDeviceModel,
    ) -> Result<LoRaDeviceModel, ApiError> {
        let mut entity = self.find_editable(&model.model.model_id).await?;
        if !entity.support_lorawan_features {
            return Err(DeviceModelError::ModelNotFound(model.model.model_id.clone()).into());
        }

        self.mapper.update_lora_table_entity(&mut entity, &model);
        self.save(&entity).await?;

        Ok(self.mapper.create_lora_device_model(&entity))
    }

    pub async fn delete_lora_model(&self, model_id: &str) -> Result<(), ApiError> {
        self.find_lora(model_id).await?;
        self.delete_model(model_id).await
    }

    pub async fn get_commands(&self, model_id: &str) -> Result<Vec<DeviceModelCommand>, ApiError> {
        self.find_lora(model_id).await?;

        Ok(self
            .command_repository
            .find_by_model_id(model_id)
            .await?
            .iter()
            .map(|entity| DeviceModelCommandMapper.create_command(entity))
            .collect())
    }

    pub async fn set_commands(
        &self,
        model_id: &str,
        commands: Vec<DeviceModelCommand>,
    ) -> Result<Vec<DeviceModelCommand>, ApiError> {
        let entity = self.find_lora(model_id).await?;
        if entity.is_builtin {
            return Err(DeviceModelError::BuiltinModel(model_id.to_string()).into());
        }

        let mut entities = Vec::with_capacity(commands.len());
        for mut command in commands {
            validate_command(&command)?;
            command.id = new_id(&command.id);
            entities.push(DeviceModelCommandMapper.create_table_entity(model_id, &command));
        }

        let mut tx = self.command_repository.get_pool().begin().await?;
        self.command_repository
            .save_all(model_id, &entities, &mut tx)
            .await?;
        tx.commit().await?;

        tracing::info!(model_id = %model_id, count = entities.len(), "model commands replaced");

        self.get_commands(model_id).await
    }
}
