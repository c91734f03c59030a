use iotportal_api::models::DeviceModelCommand;

use crate::models::DeviceModelCommandEntity;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceModelCommandMapper;

impl DeviceModelCommandMapper {
    pub fn create_command(&self, entity: &DeviceModelCommandEntity) -> DeviceModelCommand {
        DeviceModelCommand {
            id: entity.row_key.clone(),
            name: entity.name.clone(),
            frame: entity.frame.clone(),
            port: entity.port,
            confirmed: entity.confirmed,
            is_builtin: entity.is_builtin,
        }
    }

    pub fn create_table_entity(
        &self,
        model_id: &str,
        command: &DeviceModelCommand,
    ) -> DeviceModelCommandEntity {
        DeviceModelCommandEntity {
            partition_key: model_id.to_string(),
            row_key: command.id.clone(),
            name: command.name.clone(),
            frame: command.frame.to_ascii_uppercase(),
            port: command.port,
            confirmed: command.confirmed,
            is_builtin: command.is_builtin,
        }
    }
}
