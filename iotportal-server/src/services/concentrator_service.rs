use std::sync::Arc;

use iotportal_api::models::{CONCENTRATOR_DEVICE_TYPE, Concentrator, PaginatedResult};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::device_service::DeviceQuery;
use super::validation::is_eui;
use crate::errors::{ApiError, ConcentratorError, DeviceError, RegistryError};
use crate::mappers::ConcentratorTwinMapper;
use crate::registry::{Twin, TwinFilter, TwinQuery, TwinRegistry};

const ROUTE: &str = "/api/lorawan/concentrators";

/// Fetches the LoRa Basics Station router configuration of a frequency plan.
pub struct RouterConfigClient {
    client: Client,
    base_url: String,
}

impl RouterConfigClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn get_router_config(&self, region: &str) -> Result<Value, ConcentratorError> {
        if region.is_empty() || !region.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConcentratorError::UnknownRegion(region.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/{region}.json", self.base_url))
            .send()
            .await
            .map_err(|e| ConcentratorError::RouterConfigUnavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| ConcentratorError::RouterConfigUnavailable(e.to_string())),
            StatusCode::NOT_FOUND => Err(ConcentratorError::UnknownRegion(region.to_string())),
            status => Err(ConcentratorError::RouterConfigUnavailable(format!(
                "router configuration endpoint returned {status}"
            ))),
        }
    }
}

pub struct ConcentratorService {
    registry: Arc<dyn TwinRegistry>,
    router_config_client: Arc<RouterConfigClient>,
    mapper: ConcentratorTwinMapper,
}

fn base_filter() -> TwinFilter {
    TwinFilter {
        is_edge: Some(false),
        device_type: Some(CONCENTRATOR_DEVICE_TYPE.to_string()),
        ..Default::default()
    }
}

fn validate(concentrator: &Concentrator) -> Result<(), ConcentratorError> {
    if !is_eui(&concentrator.device_id) {
        return Err(ConcentratorError::InvalidStationEui(
            concentrator.device_id.clone(),
        ));
    }

    if concentrator.device_name.trim().is_empty() {
        return Err(ConcentratorError::InvalidRequest(
            "device name is required".into(),
        ));
    }

    if concentrator.lora_region.trim().is_empty() {
        return Err(ConcentratorError::InvalidRequest(
            "LoRa region is required".into(),
        ));
    }

    Ok(())
}

impl ConcentratorService {
    pub fn new(registry: Arc<dyn TwinRegistry>, router_config_client: Arc<RouterConfigClient>) -> Self {
        Self {
            registry,
            router_config_client,
            mapper: ConcentratorTwinMapper,
        }
    }

    async fn find_twin(&self, device_id: &str) -> Result<Option<Twin>, ApiError> {
        Ok(self
            .registry
            .get_twin(device_id)
            .await?
            .filter(|twin| base_filter().matches(twin)))
    }

    pub async fn get_concentrators(
        &self,
        query: &DeviceQuery,
    ) -> Result<PaginatedResult<Concentrator>, ApiError> {
        if let Some(name) = query.tags.keys().next() {
            return Err(DeviceError::UnknownTagFilter(name.clone()).into());
        }

        let mut filter = base_filter();
        filter.search_text = query.search_text.clone();
        filter.is_enabled = query.is_enabled;
        filter.is_connected = query.is_connected;

        let page = self
            .registry
            .query_twins(&TwinQuery {
                filter,
                page_size: query.page_size,
                page_number: query.page_number,
            })
            .await?;

        Ok(PaginatedResult {
            items: page
                .twins
                .iter()
                .map(|twin| self.mapper.create_concentrator(twin))
                .collect(),
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

    pub async fn get_concentrator(&self, device_id: &str) -> Result<Concentrator, ApiError> {
        let twin = self
            .find_twin(device_id)
            .await?
            .ok_or_else(|| ConcentratorError::ConcentratorNotFound(device_id.to_string()))?;

        Ok(self.mapper.create_concentrator(&twin))
    }

    pub async fn create_concentrator(
        &self,
        mut concentrator: Concentrator,
    ) -> Result<Concentrator, ApiError> {
        validate(&concentrator)?;

        if self.registry.get_twin(&concentrator.device_id).await?.is_some() {
            return Err(
                ConcentratorError::ConcentratorAlreadyExists(concentrator.device_id.clone()).into(),
            );
        }

        concentrator.router_config = Some(
            self.router_config_client
                .get_router_config(&concentrator.lora_region)
                .await?,
        );

        let mut twin = Twin::new(&concentrator.device_id);
        self.mapper.update_twin(&mut twin, &concentrator);

        let created = match self.registry.create_device(&twin).await {
            Ok(created) => created,
            Err(RegistryError::AlreadyExists(id)) => {
                return Err(ConcentratorError::ConcentratorAlreadyExists(id).into());
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            device_id = %concentrator.device_id,
            region = %concentrator.lora_region,
            "concentrator created"
        );

        Ok(self.mapper.create_concentrator(&created))
    }

    pub async fn update_concentrator(
        &self,
        mut concentrator: Concentrator,
    ) -> Result<Concentrator, ApiError> {
        validate(&concentrator)?;

        let mut twin = self.find_twin(&concentrator.device_id).await?.ok_or_else(|| {
            ConcentratorError::ConcentratorNotFound(concentrator.device_id.clone())
        })?;

        concentrator.router_config = Some(
            self.router_config_client
                .get_router_config(&concentrator.lora_region)
                .await?,
        );

        self.mapper.update_twin(&mut twin, &concentrator);
        let updated = self.registry.update_twin(&twin).await?;

        tracing::info!(device_id = %concentrator.device_id, "concentrator updated");

        Ok(self.mapper.create_concentrator(&updated))
    }

    pub async fn delete_concentrator(&self, device_id: &str) -> Result<(), ApiError> {
        if self.find_twin(device_id).await?.is_none() {
            return Err(ConcentratorError::ConcentratorNotFound(device_id.to_string()).into());
        }

        self.registry.delete_device(device_id).await?;

        tracing::info!(device_id = %device_id, "concentrator deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockito::Server;
    use serde_json::json;

    use super::*;
    use crate::configs::{SchemaManager, Settings, Storage};
    use crate::registry::LocalRegistry;

    async fn service(router_config_url: &str) -> ConcentratorService {
        let storage = Arc::new(
            Storage::new(Settings::default().database, SchemaManager::default())
                .await
                .unwrap(),
        );

        ConcentratorService::new(
            Arc::new(LocalRegistry::new(storage)),
            Arc::new(RouterConfigClient::new(router_config_url)),
        )
    }

    fn concentrator(id: &str, region: &str) -> Concentrator {
        Concentrator {
            device_id: id.into(),
            device_name: "Roof gateway".into(),
            lora_region: region.into(),
            device_type: CONCENTRATOR_DEVICE_TYPE.into(),
            client_thumbprint: Some("AB12".into()),
            is_connected: false,
            is_enabled: true,
            already_logged_in_once: false,
            router_config: None,
        }
    }

    #[tokio::test]
    async fn test_create_fetches_router_config() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/EU863.json")
            .with_status(200)
            .with_body(r#"{"NetID":[1],"freq_range":[863000000,870000000]}"#)
            .create_async()
            .await;

        let service = service(&server.url()).await;
        let created = service
            .create_concentrator(concentrator("0011aabbccddeeff", "EU863"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(created.device_id, "0011aabbccddeeff");
        assert_eq!(created.router_config.unwrap()["NetID"], json!([1]));
        assert_eq!(created.client_thumbprint.as_deref(), Some("AB12"));

        let page = service.get_concentrators(&DeviceQuery::default()).await.unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(service.count(Some(true)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_region_is_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/XX000.json")
            .with_status(404)
            .create_async()
            .await;

        let service = service(&server.url()).await;

        assert!(matches!(
            service
                .create_concentrator(concentrator("0011AABBCCDDEEFF", "XX000"))
                .await,
            Err(ApiError::ConcentratorError(ConcentratorError::UnknownRegion(_)))
        ));
        assert!(matches!(
            service.get_concentrator("0011AABBCCDDEEFF").await,
            Err(ApiError::ConcentratorError(ConcentratorError::ConcentratorNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_station_eui_is_validated() {
        let service = service("http://127.0.0.1:9").await;

        assert!(matches!(
            service.create_concentrator(concentrator("gateway-1", "EU863")).await,
            Err(ApiError::ConcentratorError(ConcentratorError::InvalidStationEui(_)))
        ));
    }
}
