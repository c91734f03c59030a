use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use iotportal_api::models::LORA_DEVICE_TYPE;
use reqwest::Client;
use serde::Serialize;

use super::validation::decode_hex;
use crate::errors::{ApiError, DeviceError};
use crate::mappers::DeviceModelCommandMapper;
use crate::registry::{TwinFilter, TwinRegistry};
use crate::repositories::DeviceModelCommandRepository;

const FUNCTIONS_KEY_HEADER: &str = "x-functions-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CloudToDeviceMessage {
    raw_payload: String,
    fport: i32,
    confirmed: bool,
}

/// Sends model commands to LoRaWAN devices through the network server facade.
pub struct LoRaWanCommandService {
    client: Client,
    function_url: String,
    function_key: Option<String>,
    registry: Arc<dyn TwinRegistry>,
    command_repository: Arc<DeviceModelCommandRepository>,
}

impl LoRaWanCommandService {
    pub fn new(
        function_url: impl Into<String>,
        function_key: Option<String>,
        registry: Arc<dyn TwinRegistry>,
        command_repository: Arc<DeviceModelCommandRepository>,
    ) -> Self {
        Self {
            client: Client::new(),
            function_url: function_url.into().trim_end_matches('/').to_string(),
            function_key,
            registry,
            command_repository,
        }
    }

    /// Only LoRaWAN device twins accept commands; any other twin is reported as not found.
    pub async fn execute_command(&self, device_id: &str, command_id: &str) -> Result<(), ApiError> {
        let lora_devices = TwinFilter {
            is_edge: Some(false),
            device_type: Some(LORA_DEVICE_TYPE.to_string()),
            ..Default::default()
        };

        let twin = self
            .registry
            .get_twin(device_id)
            .await?
            .filter(|twin| lora_devices.matches(twin))
            .ok_or_else(|| DeviceError::DeviceNotFound(device_id.to_string()))?;

        let model_id = twin.tag_or_default("modelId");
        let command = self
            .command_repository
            .find_by_id(&model_id, command_id)
            .await?
            .map(|entity| DeviceModelCommandMapper.create_command(&entity))
            .ok_or_else(|| DeviceError::CommandNotFound(command_id.to_string()))?;

        let frame = decode_hex(&command.frame).ok_or_else(|| {
            DeviceError::CommandFailed(format!("command {} has an invalid frame", command.name))
        })?;

        let message = CloudToDeviceMessage {
            raw_payload: STANDARD.encode(frame),
            fport: command.port,
            confirmed: command.confirmed,
        };

        let mut request = self
            .client
            .post(format!(
                "{}/api/cloudtodevicemessage/{}",
                self.function_url,
                urlencoding::encode(device_id)
            ))
            .json(&message);
        if let Some(key) = &self.function_key {
            request = request.header(FUNCTIONS_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeviceError::CommandFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(device_id = %device_id, command = %command.name, %status, body = %body, "command rejected");
            return Err(DeviceError::CommandFailed(format!("network server returned {status}")).into());
        }

        tracing::info!(device_id = %device_id, command = %command.name, "command sent");

        Ok(())
    }
}
