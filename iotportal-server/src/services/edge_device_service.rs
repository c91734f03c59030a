use std::collections::BTreeSet;
use std::sync::Arc;

use iotportal_api::models::{EdgeDevice, EdgeDeviceListItem, PaginatedResult};
use serde_json::{Value, json};

use super::device_service::{DeviceQuery, load_device_tags};
use super::validation::{check_required_tags, is_valid_device_id};
use crate::errors::{ApiError, EdgeError, RegistryError};
use crate::mappers::EdgeDeviceMapper;
use crate::registry::{DirectMethod, Twin, TwinFilter, TwinQuery, TwinRegistry};
use crate::repositories::{DeviceTagRepository, EdgeDeviceModelRepository};

const ROUTE: &str = "/api/edge/devices";
const EDGE_AGENT: &str = "$edgeAgent";
const EDGE_HUB: &str = "$edgeHub";
const RESTART_METHOD: &str = "RestartModule";
const METHOD_TIMEOUT_SECS: u32 = 30;

fn base_filter() -> TwinFilter {
    TwinFilter {
        is_edge: Some(true),
        ..Default::default()
    }
}

/// Module names known to the edge agent, from its desired and reported documents.
fn known_modules(agent: &Twin) -> BTreeSet<String> {
    let mut names = BTreeSet::new();

    for document in [&agent.properties.desired, &agent.properties.reported] {
        for section in ["modules", "systemModules"] {
            if let Some(Value::Object(modules)) = document.get(section) {
                names.extend(modules.keys().cloned());
            }
        }
    }

    names
}

pub struct EdgeDeviceService {
    registry: Arc<dyn TwinRegistry>,
    edge_model_repository: Arc<EdgeDeviceModelRepository>,
    device_tag_repository: Arc<DeviceTagRepository>,
    mapper: EdgeDeviceMapper,
}

impl EdgeDeviceService {
    pub fn new(
        registry: Arc<dyn TwinRegistry>,
        edge_model_repository: Arc<EdgeDeviceModelRepository>,
        device_tag_repository: Arc<DeviceTagRepository>,
    ) -> Self {
        Self {
            registry,
            edge_model_repository,
            device_tag_repository,
            mapper: EdgeDeviceMapper,
        }
    }

    async fn find_twin(&self, device_id: &str) -> Result<Option<Twin>, ApiError> {
        Ok(self
            .registry
            .get_twin(device_id)
            .await?
            .filter(|twin| twin.is_edge()))
    }

    /// Downstream devices connected through the gateway's edge hub.
    async fn connected_devices(&self, device_id: &str) -> Result<u32, ApiError> {
        let hub = self.registry.get_module_twin(device_id, EDGE_HUB).await?;

        Ok(hub
            .as_ref()
            .and_then(|hub| hub.reported("clients"))
            .and_then(Value::as_object)
            .map_or(0, |clients| clients.len() as u32))
    }

    async fn validate(&self, device: &EdgeDevice) -> Result<(), ApiError> {
        if !is_valid_device_id(&device.device_id) {
            return Err(EdgeError::InvalidRequest(format!(
                "invalid device id {}",
                device.device_id
            ))
            .into());
        }

        if device.device_name.trim().is_empty() {
            return Err(EdgeError::InvalidRequest("device name is required".into()).into());
        }

        if self
            .edge_model_repository
            .find_by_id(&device.model_id)
            .await?
            .is_none()
        {
            return Err(
                EdgeError::InvalidRequest(format!("unknown edge model {}", device.model_id)).into(),
            );
        }

        Ok(())
    }

    pub async fn get_devices(
        &self,
        query: &DeviceQuery,
    ) -> Result<PaginatedResult<EdgeDeviceListItem>, ApiError> {
        let tags = load_device_tags(&self.device_tag_repository).await?;
        let filter = query.to_filter(base_filter(), &tags)?;

        let page = self
            .registry
            .query_twins(&TwinQuery {
                filter,
                page_size: query.page_size,
                page_number: query.page_number,
            })
            .await?;

        let mut items = Vec::with_capacity(page.twins.len());
        for twin in &page.twins {
            let nb_devices = self.connected_devices(&twin.device_id).await?;
            items.push(self.mapper.create_list_item(twin, nb_devices));
        }

        Ok(PaginatedResult {
            items,
            total_items: page.total,
            page_size: query.page_size,
            current_page: query.page_number,
            next_page: query.next_page(ROUTE, page.total),
        })
    }

    pub async fn count(&self, is_connected: Option<bool>) -> Result<u64, ApiError> {
        let mut filter = base_filter();
        filter.is_connected = is_connected;

        let page = self
            .registry
            .query_twins(&TwinQuery {
                filter,
                page_size: 1,
                page_number: 0,
            })
            .await?;

        Ok(page.total)
    }

    pub async fn get_device(&self, device_id: &str) -> Result<EdgeDevice, ApiError> {
        let twin = self
            .find_twin(device_id)
            .await?
            .ok_or_else(|| EdgeError::EdgeDeviceNotFound(device_id.to_string()))?;

        let agent = self.registry.get_module_twin(device_id, EDGE_AGENT).await?;
        let nb_devices = self.connected_devices(device_id).await?;
        let tags = load_device_tags(&self.device_tag_repository).await?;

        Ok(self
            .mapper
            .create_edge_device(&twin, agent.as_ref(), nb_devices, &tags))
    }

    pub async fn create_device(&self, device: EdgeDevice) -> Result<EdgeDevice, ApiError> {
        self.validate(&device).await?;

        let tags = load_device_tags(&self.device_tag_repository).await?;
        check_required_tags(&tags, &device.tags)?;

        if self.registry.get_twin(&device.device_id).await?.is_some() {
            return Err(EdgeError::EdgeDeviceAlreadyExists(device.device_id.clone()).into());
        }

        let mut twin = Twin::new(&device.device_id);
        self.mapper.update_twin(&mut twin, &device, &tags);

        match self.registry.create_device(&twin).await {
            Ok(_) => {}
            Err(RegistryError::AlreadyExists(id)) => {
                return Err(EdgeError::EdgeDeviceAlreadyExists(id).into());
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(device_id = %device.device_id, model_id = %device.model_id, "edge device created");

        self.get_device(&device.device_id).await
    }

    pub async fn update_device(&self, device: EdgeDevice) -> Result<EdgeDevice, ApiError> {
        self.validate(&device).await?;

        let tags = load_device_tags(&self.device_tag_repository).await?;
        check_required_tags(&tags, &device.tags)?;

        let mut twin = self
            .find_twin(&device.device_id)
            .await?
            .ok_or_else(|| EdgeError::EdgeDeviceNotFound(device.device_id.clone()))?;

        self.mapper.update_twin(&mut twin, &device, &tags);
        self.registry.update_twin(&twin).await?;

        tracing::info!(device_id = %device.device_id, "edge device updated");

        self.get_device(&device.device_id).await
    }

    pub async fn delete_device(&self, device_id: &str) -> Result<(), ApiError> {
        if self.find_twin(device_id).await?.is_none() {
            return Err(EdgeError::EdgeDeviceNotFound(device_id.to_string()).into());
        }

        self.registry.delete_device(device_id).await?;

        tracing::info!(device_id = %device_id, "edge device deleted");

        Ok(())
    }

    /// Asks the edge agent to restart one module.
    pub async fn restart_module(&self, device_id: &str, module_name: &str) -> Result<(), ApiError> {
        if self.find_twin(device_id).await?.is_none() {
            return Err(EdgeError::EdgeDeviceNotFound(device_id.to_string()).into());
        }

        let agent = self
            .registry
            .get_module_twin(device_id, EDGE_AGENT)
            .await?
            .ok_or_else(|| EdgeError::ModuleNotFound(module_name.to_string()))?;

        if !known_modules(&agent).contains(module_name) {
            return Err(EdgeError::ModuleNotFound(module_name.to_string()).into());
        }

        let method = DirectMethod {
            method_name: RESTART_METHOD.to_string(),
            payload: json!({ "schemaVersion": "1.0", "id": module_name }),
            response_timeout_in_seconds: METHOD_TIMEOUT_SECS,
        };

        let result = self
            .registry
            .invoke_module_method(device_id, EDGE_AGENT, &method)
            .await?;

        if !(200..300).contains(&result.status) {
            tracing::warn!(device_id = %device_id, module = %module_name, status = result.status, "module restart failed");
            return Err(EdgeError::MethodFailed(result.status).into());
        }

        tracing::info!(device_id = %device_id, module = %module_name, "module restarted");

        Ok(())
    }
}
